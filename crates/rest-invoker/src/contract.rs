//! Declarative API contracts.
//!
//! A contract lists the methods of one API type together with their route
//! metadata. It can be assembled in code or loaded from YAML or JSON:
//!
//! ```yaml
//! name: UserApi
//! mapping:
//!   path: /api
//!   produces: application/json
//! methods:
//!   get_user:
//!     mapping: { method: GET, path: "/users/{id}" }
//!     parameters:
//!       - name: id
//!         binding: { kind: path }
//!     returns: ResponseEntity<User>
//! ```

use crate::response_type::TypeDescriptor;
use crate::route::{MethodId, MethodRoute, Parameter, RequestMapping};
use anyhow::Context;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declaration of one API method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<RequestMapping>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default = "TypeDescriptor::unit")]
    pub returns: TypeDescriptor,
}

impl MethodDecl {
    pub fn new(mapping: RequestMapping) -> Self {
        Self {
            mapping: Some(mapping),
            parameters: Vec::new(),
            returns: TypeDescriptor::unit(),
        }
    }

    /// A method carrying no request mapping. Calls to it fail to build.
    pub fn unmapped() -> Self {
        Self {
            mapping: None,
            parameters: Vec::new(),
            returns: TypeDescriptor::unit(),
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, returns: TypeDescriptor) -> Self {
        self.returns = returns;
        self
    }
}

/// Route metadata for every method of one API type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiContract {
    pub name: String,
    /// Type-level mapping shared by every method
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<RequestMapping>,
    #[serde(default)]
    pub methods: IndexMap<String, MethodDecl>,
}

impl ApiContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapping: None,
            methods: IndexMap::new(),
        }
    }

    pub fn with_mapping(mut self, mapping: RequestMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Declare a method. Redeclaring a name replaces it in place.
    pub fn method(mut self, name: impl Into<String>, decl: MethodDecl) -> Self {
        self.methods.insert(name.into(), decl);
        self
    }

    /// Load a contract; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read API contract {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid API contract {}", path.display()))
        } else {
            Self::from_yaml_str(&contents)
                .with_context(|| format!("Invalid API contract {}", path.display()))
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Precomputed route for `method`, if declared.
    pub fn route(&self, method: &str) -> Option<MethodRoute> {
        self.methods.get(method).map(|decl| self.to_route(method, decl))
    }

    /// Routes for every declared method, in declaration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, MethodRoute)> + '_ {
        self.methods
            .iter()
            .map(|(name, decl)| (name.as_str(), self.to_route(name, decl)))
    }

    fn to_route(&self, method: &str, decl: &MethodDecl) -> MethodRoute {
        MethodRoute {
            id: MethodId::new(&self.name, method),
            class_mapping: self.mapping.clone(),
            mapping: decl.mapping.clone(),
            parameters: decl.parameters.clone(),
            return_type: decl.returns.clone(),
        }
    }
}

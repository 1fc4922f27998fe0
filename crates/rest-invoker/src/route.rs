//! Route metadata: HTTP verbs, request mappings and parameter bindings.
//!
//! These records are the resolved form of whatever declares an API (a YAML
//! contract, a hand-written table). The descriptor builder consumes them and
//! never looks at how they were produced.

use crate::response_type::TypeDescriptor;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// HTTP verb of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown HTTP method: {s}"))
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Accept either a single value or a list where a list is expected.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        One(T),
        Many(Vec<T>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(vs) => vs,
    })
}

/// Request mapping declared on an API type or one of its methods.
///
/// Every field is a list because declarations may list several values; the
/// first entry is the one used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMapping {
    #[serde(default, deserialize_with = "one_or_many")]
    pub method: Vec<HttpMethod>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub path: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub consumes: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub produces: Vec<String>,
}

impl RequestMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new().method(HttpMethod::Get).path(path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new().method(HttpMethod::Post).path(path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new().method(HttpMethod::Put).path(path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new().method(HttpMethod::Patch).path(path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new().method(HttpMethod::Delete).path(path)
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method.push(method);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path.push(path.into());
        self
    }

    pub fn consumes(mut self, content_type: impl Into<String>) -> Self {
        self.consumes.push(content_type.into());
        self
    }

    pub fn produces(mut self, content_type: impl Into<String>) -> Self {
        self.produces.push(content_type.into());
        self
    }

    pub fn first_method(&self) -> Option<HttpMethod> {
        self.method.first().copied()
    }

    pub fn first_path(&self) -> Option<&str> {
        self.path.first().map(String::as_str)
    }

    pub fn first_consumes(&self) -> Option<&str> {
        self.consumes.first().map(String::as_str)
    }

    pub fn first_produces(&self) -> Option<&str> {
        self.produces.first().map(String::as_str)
    }
}

/// Which part of the request an argument is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Header,
    Path,
    Query,
    Body,
}

/// Binding of one parameter to a request part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub kind: BindingKind,
    /// Explicit key, takes precedence over `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Declared binding name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Header and query bindings only
    #[serde(default = "default_required")]
    pub required: bool,
    /// Query bindings only: substituted for a blank scalar value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

fn default_required() -> bool {
    true
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Binding {
    pub fn new(kind: BindingKind) -> Self {
        Self {
            kind,
            value: None,
            name: None,
            required: true,
            default_value: None,
        }
    }

    /// Key used in the request: explicit value, else declared name, else the
    /// parameter's own name.
    pub fn resolve_key<'a>(&'a self, parameter_name: &'a str) -> &'a str {
        non_blank(&self.value)
            .or_else(|| non_blank(&self.name))
            .unwrap_or(parameter_name)
    }
}

/// One declared parameter of an API method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameters without a binding are ignored when building a descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
}

impl Parameter {
    fn bound(name: impl Into<String>, kind: BindingKind) -> Self {
        Self {
            name: name.into(),
            binding: Some(Binding::new(kind)),
        }
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::bound(name, BindingKind::Header)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::bound(name, BindingKind::Path)
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::bound(name, BindingKind::Query)
    }

    pub fn body(name: impl Into<String>) -> Self {
        Self::bound(name, BindingKind::Body)
    }

    pub fn unbound(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            binding: None,
        }
    }

    /// Set the explicit request key.
    pub fn named(mut self, key: impl Into<String>) -> Self {
        if let Some(binding) = self.binding.as_mut() {
            binding.value = Some(key.into());
        }
        self
    }

    pub fn optional(mut self) -> Self {
        if let Some(binding) = self.binding.as_mut() {
            binding.required = false;
        }
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        if let Some(binding) = self.binding.as_mut() {
            binding.default_value = Some(value.into());
        }
        self
    }

    pub fn kind(&self) -> Option<BindingKind> {
        self.binding.as_ref().map(|b| b.kind)
    }
}

/// Identity of an API method: declaring type plus method name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    pub declaring_type: String,
    pub method: String,
}

impl MethodId {
    pub fn new(declaring_type: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.declaring_type, self.method)
    }
}

/// Precomputed routing table for one API method.
///
/// Built once per method and shared across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRoute {
    pub id: MethodId,
    pub class_mapping: Option<RequestMapping>,
    pub mapping: Option<RequestMapping>,
    pub parameters: Vec<Parameter>,
    pub return_type: TypeDescriptor,
}

impl MethodRoute {
    pub fn new(id: MethodId, mapping: RequestMapping) -> Self {
        Self {
            id,
            class_mapping: None,
            mapping: Some(mapping),
            parameters: Vec::new(),
            return_type: TypeDescriptor::unit(),
        }
    }

    pub fn with_class_mapping(mut self, mapping: RequestMapping) -> Self {
        self.class_mapping = Some(mapping);
        self
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, return_type: TypeDescriptor) -> Self {
        self.return_type = return_type;
        self
    }
}

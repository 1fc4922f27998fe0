//! Invocation descriptors: the normalized, transport-agnostic form of one call.

mod builder;

pub use builder::{build, join_endpoint, placeholders, stringify};

use crate::multimap::MultiValueMap;
use crate::response_type::TypeDescriptor;
use crate::route::{HttpMethod, MethodId};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

/// Resolved path parameters, one value per key.
pub type PathParams = IndexMap<String, String>;

/// One resolved call, immutable once built.
///
/// Every `{placeholder}` in the endpoint has an entry in the path params.
/// At most one parameter contributes the request body.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationDescriptor {
    pub(crate) method_id: MethodId,
    pub(crate) base_path: String,
    pub(crate) endpoint: String,
    pub(crate) method: HttpMethod,
    pub(crate) headers: MultiValueMap,
    pub(crate) path_params: PathParams,
    pub(crate) query_params: MultiValueMap,
    pub(crate) request_body: Option<Value>,
    pub(crate) response_type: TypeDescriptor,
    pub(crate) declared_response_type: TypeDescriptor,
}

impl InvocationDescriptor {
    pub fn method_id(&self) -> &MethodId {
        &self.method_id
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Path template, placeholders left unsubstituted.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &MultiValueMap {
        &self.headers
    }

    pub fn path_params(&self) -> &PathParams {
        &self.path_params
    }

    pub fn query_params(&self) -> &MultiValueMap {
        &self.query_params
    }

    pub fn request_body(&self) -> Option<&Value> {
        self.request_body.as_ref()
    }

    /// Expected result shape, with any entity envelope already unwrapped.
    pub fn response_type(&self) -> &TypeDescriptor {
        &self.response_type
    }

    /// Return type exactly as declared on the method.
    pub fn declared_response_type(&self) -> &TypeDescriptor {
        &self.declared_response_type
    }

    /// Whether the caller asked for status and headers alongside the body.
    pub fn returns_entity(&self) -> bool {
        self.declared_response_type.is_entity()
    }
}

fn write_multimap(f: &mut fmt::Formatter<'_>, label: &str, map: &MultiValueMap) -> fmt::Result {
    write!(f, "  {label}: ")?;
    if map.is_empty() {
        return writeln!(f, "N/A");
    }
    writeln!(f)?;
    for (key, values) in map.iter() {
        writeln!(f, "    {} -> {}", key, values.join(", "))?;
    }
    Ok(())
}

impl fmt::Display for InvocationDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        writeln!(f, "  Method: {}", self.method_id)?;
        writeln!(f, "  Base Path: {}", self.base_path)?;
        writeln!(f, "  Endpoint: {}", self.endpoint)?;
        writeln!(f, "  HTTP Method: {}", self.method)?;
        write_multimap(f, "HTTP Headers", &self.headers)?;
        write!(f, "  Path Params: ")?;
        if self.path_params.is_empty() {
            writeln!(f, "N/A")?;
        } else {
            writeln!(f)?;
            for (key, value) in &self.path_params {
                writeln!(f, "    {key} -> {value}")?;
            }
        }
        write_multimap(f, "Query Params", &self.query_params)?;
        writeln!(
            f,
            "  Body: {}",
            if self.request_body.is_some() { "present" } else { "N/A" }
        )?;
        writeln!(f, "  Response Type: {}", self.declared_response_type)?;
        write!(f, "]")
    }
}

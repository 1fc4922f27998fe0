//! Error types for descriptor building, mock retrieval and dispatch.

use crate::route::MethodId;
use std::path::PathBuf;

/// Route metadata is missing or unusable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Request mapping missing on method {0}")]
    MissingMapping(MethodId),
    #[error("Unable to retrieve HTTP method from {0}")]
    MissingHttpMethod(MethodId),
    #[error("Unable to retrieve endpoint from {0}")]
    BlankEndpoint(MethodId),
    #[error("Method {0} binds more than one parameter to the request body")]
    MultipleBodies(MethodId),
    #[error("Method {method} expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        method: MethodId,
        expected: usize,
        actual: usize,
    },
    #[error("Unknown method '{method}' on {declaring_type}")]
    UnknownMethod {
        declaring_type: String,
        method: String,
    },
}

/// A call argument could not be bound to the request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BindingError {
    #[error("Missing value for required header '{key}' on {method}")]
    MissingHeader { method: MethodId, key: String },
    #[error("Missing value for required query parameter '{key}' on {method}")]
    MissingQueryParam { method: MethodId, key: String },
    #[error("Null value for path parameter '{key}' on {method}")]
    NullPathParam { method: MethodId, key: String },
    #[error("Missing values for the following path param(s) on {method}: {}", .names.join(", "))]
    UnresolvedPathParams { method: MethodId, names: Vec<String> },
}

impl BindingError {
    /// Keys this error refers to.
    pub fn keys(&self) -> Vec<&str> {
        match self {
            BindingError::MissingHeader { key, .. }
            | BindingError::MissingQueryParam { key, .. }
            | BindingError::NullPathParam { key, .. } => vec![key.as_str()],
            BindingError::UnresolvedPathParams { names, .. } => {
                names.iter().map(String::as_str).collect()
            }
        }
    }
}

/// Failure to build an invocation descriptor.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Binding(#[from] BindingError),
}

/// Failure to produce a mock response.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Failed to read mock fixture {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid JSON mock fixture {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid YAML mock fixture {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure while dispatching a descriptor.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No mock found for {descriptor}")]
    NoMockFound { descriptor: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[cfg(feature = "http")]
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Failure of a client-level invocation.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error("Failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

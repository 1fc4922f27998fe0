//! File-backed response provider.
//!
//! Fixtures are JSON or YAML documents with the same shape as an in-memory
//! mock:
//!
//! ```yaml
//! status: 200
//! headers:
//!   Content-Type: application/json
//!   Set-Cookie: [a=1, b=2]
//! body:
//!   id: 42
//! ```
//!
//! The file is read on every retrieval, so it can be edited between calls.

use super::provider::ResponseProvider;
use super::MockResponse;
use crate::config::ClientConfig;
use crate::error::ProviderError;
use crate::multimap::MultiValueMap;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk fixture document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Fixture {
    #[serde(default, alias = "httpStatus", deserialize_with = "deserialize_status_code")]
    status: Option<u16>,
    #[serde(
        default = "MultiValueMap::case_insensitive",
        alias = "httpHeaders",
        deserialize_with = "crate::multimap::deserialize_headers"
    )]
    headers: MultiValueMap,
    #[serde(default)]
    body: Option<Value>,
}

/// Accept a status as a number or a numeric string.
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| D::Error::custom("invalid status code number")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u16>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}"))),
        Some(_) => Err(D::Error::custom("status must be a number or string")),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Format::Yaml
            }
            _ => Format::Json,
        }
    }
}

/// Provider reading a fixture file resolved against a lookup root.
#[derive(Debug, Clone)]
pub struct FixtureProvider {
    root: PathBuf,
    resource: PathBuf,
}

impl FixtureProvider {
    pub fn new(root: impl Into<PathBuf>, resource: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            resource: resource.into(),
        }
    }

    /// Resolve `resource` against the configured fixture root.
    pub fn from_config(config: &ClientConfig, resource: impl Into<PathBuf>) -> Self {
        Self::new(&config.fixture_root, resource)
    }

    /// Full path of the backing file.
    pub fn path(&self) -> PathBuf {
        self.root.join(&self.resource)
    }

    fn load(path: &Path) -> Result<Fixture, ProviderError> {
        let contents = std::fs::read_to_string(path).map_err(|source| {
            warn!("Failed to read mock fixture {}: {}", path.display(), source);
            ProviderError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        match Format::of(path) {
            Format::Json => serde_json::from_str(&contents).map_err(|source| ProviderError::Json {
                path: path.to_path_buf(),
                source,
            }),
            Format::Yaml => serde_yaml::from_str(&contents).map_err(|source| ProviderError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl ResponseProvider for FixtureProvider {
    fn retrieve(&self) -> Result<MockResponse, ProviderError> {
        let path = self.path();
        debug!("Loading mock fixture {}", path.display());
        let fixture = Self::load(&path)?;

        Ok(MockResponse {
            status: fixture.status,
            headers: fixture.headers,
            body: fixture.body.filter(|b| !b.is_null()),
        })
    }
}

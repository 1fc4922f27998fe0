//! Client configuration.

use crate::multimap::MultiValueMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Scheme, host and optional prefix every endpoint is appended to.
    pub base_path: String,

    /// Directory fixture files are resolved against.
    #[serde(default = "default_fixture_root")]
    pub fixture_root: PathBuf,

    #[serde(default)]
    pub http: HttpConfig,
}

/// Settings for the real HTTP dispatcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Sent on every request in addition to the bound headers.
    #[serde(
        default = "MultiValueMap::case_insensitive",
        deserialize_with = "crate::multimap::deserialize_headers"
    )]
    pub default_headers: MultiValueMap,
}

fn default_fixture_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("rest-invoker/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            default_headers: MultiValueMap::case_insensitive(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ClientConfig {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            fixture_root: default_fixture_root(),
            http: HttpConfig::default(),
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base_path.trim().is_empty() {
            anyhow::bail!("basePath must not be blank");
        }
        if self.http.timeout_secs == 0 {
            anyhow::bail!("http.timeoutSecs must be greater than zero");
        }
        Ok(())
    }
}

//! Response providers and the in-memory variant.

use super::MockResponse;
use crate::error::ProviderError;
use crate::multimap::MultiValueMap;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Produces a [`MockResponse`] each time a mock is hit.
pub trait ResponseProvider: Send + Sync {
    fn retrieve(&self) -> Result<MockResponse, ProviderError>;
}

impl<P: ResponseProvider + ?Sized> ResponseProvider for Arc<P> {
    fn retrieve(&self) -> Result<MockResponse, ProviderError> {
        (**self).retrieve()
    }
}

/// Provider built in code.
///
/// Setters take `&self`, so a provider already registered through an `Arc`
/// can still be amended; [`retrieve`](ResponseProvider::retrieve) returns a
/// snapshot of the state at call time. Headers accumulate across calls.
#[derive(Debug, Default)]
pub struct InMemoryProvider {
    state: RwLock<MockResponse>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, status: u16) -> &Self {
        self.state.write().status = Some(status);
        self
    }

    /// Append one header value.
    pub fn header(&self, key: impl AsRef<str>, value: impl Into<String>) -> &Self {
        self.state.write().headers.add(key, value);
        self
    }

    pub fn header_values<I, S>(&self, key: impl AsRef<str>, values: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state.write().headers.add_all(key, values);
        self
    }

    /// Merge a whole header map into the current headers.
    pub fn headers(&self, headers: &MultiValueMap) -> &Self {
        self.state.write().headers.merge(headers);
        self
    }

    /// Replace the body. `Value::Null` clears it.
    pub fn body(&self, body: Value) -> &Self {
        self.state.write().body = match body {
            Value::Null => None,
            other => Some(other),
        };
        self
    }

    /// Replace the body with the JSON form of `body`.
    pub fn body_from<T: Serialize>(&self, body: &T) -> Result<&Self, serde_json::Error> {
        let value = serde_json::to_value(body)?;
        Ok(self.body(value))
    }
}

impl ResponseProvider for InMemoryProvider {
    fn retrieve(&self) -> Result<MockResponse, ProviderError> {
        Ok(self.state.read().clone())
    }
}

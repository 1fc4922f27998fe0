//! Mock responses, their providers, and the first-match dispatcher.

mod dispatcher;
mod fixture;
mod provider;

pub use dispatcher::MockDispatcher;
pub use fixture::FixtureProvider;
pub use provider::{InMemoryProvider, ResponseProvider};

use crate::dispatch::{DispatchResult, ResponseEntity};
use crate::multimap::MultiValueMap;
use serde_json::Value;

/// Status used when a mock does not set one.
pub const DEFAULT_STATUS: u16 = 200;

/// Canned response produced by a [`ResponseProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    pub status: Option<u16>,
    pub headers: MultiValueMap,
    pub body: Option<Value>,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: None,
            headers: MultiValueMap::case_insensitive(),
            body: None,
        }
    }
}

impl MockResponse {
    /// Full response; the status defaults to 200.
    pub fn into_entity(self) -> ResponseEntity {
        ResponseEntity {
            status: self.status.unwrap_or(DEFAULT_STATUS),
            headers: self.headers,
            body: self.body,
        }
    }

    /// Shape as the caller expects: the full entity, or the body alone.
    pub fn into_result(self, entity: bool) -> DispatchResult {
        if entity {
            DispatchResult::Entity(self.into_entity())
        } else {
            DispatchResult::Body(self.body)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_status_defaults_to_ok() {
        let entity = MockResponse::default().into_entity();
        assert_eq!(entity.status, 200);
        assert!(entity.body.is_none());
    }

    #[test]
    fn test_into_result_shapes() {
        let response = MockResponse {
            status: Some(404),
            body: Some(json!({"error": "gone"})),
            ..MockResponse::default()
        };
        assert_eq!(
            response.clone().into_result(false),
            DispatchResult::Body(Some(json!({"error": "gone"})))
        );
        let entity = response.into_result(true).into_entity().unwrap();
        assert_eq!(entity.status, 404);
    }
}

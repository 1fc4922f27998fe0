//! Ordered, first-match mock registry.

use super::provider::ResponseProvider;
use crate::descriptor::InvocationDescriptor;
use crate::dispatch::{DispatchResult, Dispatcher};
use crate::error::DispatchError;
use crate::matcher::MockMatcher;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct MockEntry {
    matcher: Box<dyn MockMatcher>,
    provider: Box<dyn ResponseProvider>,
}

/// Dispatcher answering from registered mocks.
///
/// Entries are scanned in registration order and the first whose matcher
/// accepts the descriptor answers. Entries are only ever appended. Matchers
/// run against a snapshot taken outside the lock, so a matcher or provider
/// may register further mocks.
#[derive(Default)]
pub struct MockDispatcher {
    entries: RwLock<Vec<Arc<MockEntry>>>,
}

impl MockDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mock after every existing one.
    pub fn add_mock(
        &self,
        matcher: impl MockMatcher + 'static,
        provider: impl ResponseProvider + 'static,
    ) -> &Self {
        let mut entries = self.entries.write();
        entries.push(Arc::new(MockEntry {
            matcher: Box::new(matcher),
            provider: Box::new(provider),
        }));
        info!("Registered mock #{}", entries.len() - 1);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn find(&self, descriptor: &InvocationDescriptor) -> Option<(usize, Arc<MockEntry>)> {
        let entries = self.entries.read().clone();
        entries
            .into_iter()
            .enumerate()
            .find(|(_, entry)| entry.matcher.matches(descriptor))
    }
}

impl fmt::Debug for MockDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDispatcher")
            .field("mocks", &self.len())
            .finish()
    }
}

impl Dispatcher for MockDispatcher {
    fn dispatch(&self, descriptor: &InvocationDescriptor) -> Result<DispatchResult, DispatchError> {
        let Some((index, entry)) = self.find(descriptor) else {
            warn!("No mock found for {}", descriptor.method_id());
            return Err(DispatchError::NoMockFound {
                descriptor: descriptor.to_string(),
            });
        };
        debug!("Mock #{} matched {}", index, descriptor.method_id());
        let response = entry.provider.retrieve()?;
        Ok(response.into_result(descriptor.returns_entity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::build;
    use crate::mock::InMemoryProvider;
    use crate::response_type::TypeDescriptor;
    use crate::route::{MethodId, MethodRoute, Parameter, RequestMapping};
    use crate::MockMatcherBuilder;
    use serde_json::json;

    fn descriptor(returns: TypeDescriptor) -> InvocationDescriptor {
        let route = MethodRoute::new(MethodId::new("UserApi", "get"), RequestMapping::get("/users/{id}"))
            .param(Parameter::path("id"))
            .returns(returns);
        build("http://localhost", &route, &[json!(1)]).unwrap()
    }

    fn provider(body: serde_json::Value) -> InMemoryProvider {
        let provider = InMemoryProvider::new();
        provider.body(body);
        provider
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mocks = MockDispatcher::new();
        mocks
            .add_mock(MockMatcherBuilder::new().build(), provider(json!("first")))
            .add_mock(MockMatcherBuilder::new().build(), provider(json!("second")));

        let result = mocks.dispatch(&descriptor(TypeDescriptor::named("String"))).unwrap();
        assert_eq!(result, DispatchResult::Body(Some(json!("first"))));
        assert_eq!(mocks.len(), 2);
    }

    #[test]
    fn test_skips_non_matching_entries() {
        let mocks = MockDispatcher::new();
        mocks
            .add_mock(MockMatcherBuilder::new().path().is_equals_to("/other").build(), provider(json!(1)))
            .add_mock(MockMatcherBuilder::new().path().is_equals_to("/users/{id}").build(), provider(json!(2)));

        let result = mocks.dispatch(&descriptor(TypeDescriptor::named("u32"))).unwrap();
        assert_eq!(result.into_body(), Some(json!(2)));
    }

    #[test]
    fn test_no_match_renders_descriptor() {
        let mocks = MockDispatcher::new();
        mocks.add_mock(MockMatcherBuilder::new().path().is_equals_to("/other").build(), provider(json!(1)));

        let err = mocks.dispatch(&descriptor(TypeDescriptor::named("u32"))).unwrap_err();
        match err {
            DispatchError::NoMockFound { descriptor } => {
                assert!(descriptor.contains("Endpoint: /users/{id}"));
                assert!(descriptor.contains("id -> 1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_entity_return_type_gets_full_response() {
        let mocks = MockDispatcher::new();
        let p = InMemoryProvider::new();
        p.header("X", "1");
        mocks.add_mock(MockMatcherBuilder::new().build(), p);

        let returns = TypeDescriptor::entity(TypeDescriptor::named("User"));
        let entity = mocks.dispatch(&descriptor(returns)).unwrap().into_entity().unwrap();
        assert_eq!(entity.status, 200);
        assert_eq!(entity.headers.first("x"), Some("1"));
        assert!(entity.body.is_none());
    }

    #[test]
    fn test_closure_matcher() {
        let mocks = MockDispatcher::new();
        mocks.add_mock(
            |d: &InvocationDescriptor| d.path_params().get("id").map(String::as_str) == Some("1"),
            provider(json!("closure")),
        );
        let result = mocks.dispatch(&descriptor(TypeDescriptor::named("String"))).unwrap();
        assert_eq!(result.body(), Some(&json!("closure")));
    }

    #[test]
    fn test_matcher_may_register_mocks_while_dispatching() {
        let mocks = Arc::new(MockDispatcher::new());
        let registry = Arc::downgrade(&mocks);
        mocks
            .add_mock(
                move |_: &InvocationDescriptor| {
                    if let Some(mocks) = registry.upgrade() {
                        mocks.add_mock(MockMatcherBuilder::new().build(), provider(json!("late")));
                    }
                    false
                },
                provider(json!("never")),
            )
            .add_mock(MockMatcherBuilder::new().build(), provider(json!("fallback")));

        let result = mocks.dispatch(&descriptor(TypeDescriptor::named("String"))).unwrap();
        assert_eq!(result.body(), Some(&json!("fallback")));
        assert_eq!(mocks.len(), 3);
    }
}

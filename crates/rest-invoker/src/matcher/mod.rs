//! Matchers selecting which mock answers a descriptor.
//!
//! A [`DescriptorMatcher`] holds one [`FieldMatcher`] per descriptor field and
//! matches when all eight do. Fields never configured match every value, so
//! a matcher built with no field calls matches every descriptor. Matchers are
//! assembled with [`MockMatcherBuilder`]:
//!
//! ```
//! use rest_invoker::{HttpMethod, MockMatcherBuilder};
//!
//! let matcher = MockMatcherBuilder::new()
//!     .path().starts_with("/api/users")
//!     .http_method().any(&[HttpMethod::Get, HttpMethod::Head])
//!     .headers().contains_key("Authorization")
//!     .build();
//! # let _ = matcher;
//! ```
//!
//! Any `Fn(&InvocationDescriptor) -> bool` closure is a [`MockMatcher`] too.

mod builder;

pub use builder::{
    BodyMatcherBuilder, FieldMatcherBuilder, HttpMethodMatcherBuilder, MapMatcherBuilder,
    MockMatcherBuilder, MultiValueMapMatcherBuilder, ResponseTypeMatcherBuilder,
    StringMatcherBuilder,
};

use crate::descriptor::{InvocationDescriptor, PathParams};
use crate::multimap::MultiValueMap;
use crate::response_type::TypeDescriptor;
use crate::route::HttpMethod;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate over a whole descriptor.
pub trait MockMatcher: Send + Sync {
    fn matches(&self, descriptor: &InvocationDescriptor) -> bool;
}

impl<F> MockMatcher for F
where
    F: Fn(&InvocationDescriptor) -> bool + Send + Sync,
{
    fn matches(&self, descriptor: &InvocationDescriptor) -> bool {
        self(descriptor)
    }
}

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Predicate over one descriptor field. The default matches everything.
pub struct FieldMatcher<T: ?Sized> {
    predicate: Option<Predicate<T>>,
}

impl<T: ?Sized> FieldMatcher<T> {
    /// Always true.
    pub fn any() -> Self {
        Self { predicate: None }
    }

    pub fn new(predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Some(Arc::new(predicate)),
        }
    }

    pub fn matches(&self, value: &T) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(value))
    }

    /// Whether a constraint was configured.
    pub fn is_constrained(&self) -> bool {
        self.predicate.is_some()
    }
}

impl<T: ?Sized> Default for FieldMatcher<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T: ?Sized> Clone for FieldMatcher<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<T: ?Sized> fmt::Debug for FieldMatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.is_constrained() { "FieldMatcher(predicate)" } else { "FieldMatcher(any)" })
    }
}

/// Logical AND of one matcher per descriptor field.
#[derive(Debug, Clone, Default)]
pub struct DescriptorMatcher {
    pub(crate) base_path: FieldMatcher<str>,
    pub(crate) endpoint: FieldMatcher<str>,
    pub(crate) method: FieldMatcher<HttpMethod>,
    pub(crate) headers: FieldMatcher<MultiValueMap>,
    pub(crate) path_params: FieldMatcher<PathParams>,
    pub(crate) query_params: FieldMatcher<MultiValueMap>,
    pub(crate) body: FieldMatcher<Option<Value>>,
    pub(crate) response_type: FieldMatcher<TypeDescriptor>,
}

impl MockMatcher for DescriptorMatcher {
    fn matches(&self, d: &InvocationDescriptor) -> bool {
        self.base_path.matches(&d.base_path)
            && self.endpoint.matches(&d.endpoint)
            && self.method.matches(&d.method)
            && self.headers.matches(&d.headers)
            && self.path_params.matches(&d.path_params)
            && self.query_params.matches(&d.query_params)
            && self.body.matches(&d.request_body)
            && self.response_type.matches(&d.response_type)
    }
}

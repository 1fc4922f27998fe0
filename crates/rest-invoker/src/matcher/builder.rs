//! Fluent assembly of [`DescriptorMatcher`]s.
//!
//! [`MockMatcherBuilder`] owns one slot per descriptor field. Each field
//! accessor hands out a [`FieldMatcherBuilder`] holding a setter into that
//! slot; whatever operation is called on it fills the slot and returns the
//! parent so further fields can be configured. Calling the same field twice
//! replaces the earlier constraint.

use super::{DescriptorMatcher, FieldMatcher};
use crate::descriptor::PathParams;
use crate::multimap::MultiValueMap;
use crate::response_type::TypeDescriptor;
use crate::route::HttpMethod;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

/// Entry point for building a descriptor matcher.
#[derive(Debug, Clone, Default)]
pub struct MockMatcherBuilder {
    matcher: DescriptorMatcher,
}

impl MockMatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_path(self) -> StringMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.base_path = f)
    }

    /// Matches the endpoint template, e.g. `/api/users/{id}`.
    pub fn path(self) -> StringMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.endpoint = f)
    }

    pub fn http_method(self) -> HttpMethodMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.method = f)
    }

    /// Header keys compare ignoring case.
    pub fn headers(self) -> MultiValueMapMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.headers = f)
    }

    pub fn path_params(self) -> MapMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.path_params = f)
    }

    pub fn query_params(self) -> MultiValueMapMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.query_params = f)
    }

    pub fn body(self) -> BodyMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.body = f)
    }

    pub fn response_type(self) -> ResponseTypeMatcherBuilder {
        FieldMatcherBuilder::new(self, |m, f| m.response_type = f)
    }

    /// AND of every configured field; unconfigured fields match anything.
    pub fn build(self) -> DescriptorMatcher {
        self.matcher
    }
}

/// Builder for a single field of type `T`.
pub struct FieldMatcherBuilder<T: ?Sized> {
    parent: MockMatcherBuilder,
    set: fn(&mut DescriptorMatcher, FieldMatcher<T>),
}

pub type StringMatcherBuilder = FieldMatcherBuilder<str>;
pub type HttpMethodMatcherBuilder = FieldMatcherBuilder<HttpMethod>;
pub type MapMatcherBuilder = FieldMatcherBuilder<PathParams>;
pub type MultiValueMapMatcherBuilder = FieldMatcherBuilder<MultiValueMap>;
pub type BodyMatcherBuilder = FieldMatcherBuilder<Option<Value>>;
pub type ResponseTypeMatcherBuilder = FieldMatcherBuilder<TypeDescriptor>;

impl<T: ?Sized> FieldMatcherBuilder<T> {
    fn new(parent: MockMatcherBuilder, set: fn(&mut DescriptorMatcher, FieldMatcher<T>)) -> Self {
        Self { parent, set }
    }

    fn with(mut self, matcher: FieldMatcher<T>) -> MockMatcherBuilder {
        (self.set)(&mut self.parent.matcher, matcher);
        self.parent
    }

    /// Match any value.
    pub fn all(self) -> MockMatcherBuilder {
        self.with(FieldMatcher::any())
    }

    /// Match with a caller-supplied predicate.
    pub fn predicate(self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> MockMatcherBuilder {
        self.with(FieldMatcher::new(predicate))
    }
}

/// Comparison applied by the plain string operations.
#[derive(Debug, Clone, Copy)]
enum TextCheck {
    Equals,
    Prefix,
    Suffix,
    Substring,
}

impl TextCheck {
    fn holds(self, actual: &str, expected: &str) -> bool {
        match self {
            TextCheck::Equals => actual == expected,
            TextCheck::Prefix => actual.starts_with(expected),
            TextCheck::Suffix => actual.ends_with(expected),
            TextCheck::Substring => actual.contains(expected),
        }
    }
}

impl StringMatcherBuilder {
    /// The expected text is lowered once here, the field on every check.
    fn text(self, check: TextCheck, expected: impl Into<String>, ignore_case: bool) -> MockMatcherBuilder {
        let expected = expected.into();
        if ignore_case {
            let expected = expected.to_lowercase();
            self.predicate(move |value: &str| check.holds(&value.to_lowercase(), &expected))
        } else {
            self.predicate(move |value: &str| check.holds(value, &expected))
        }
    }

    pub fn is_equals_to(self, value: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Equals, value, false)
    }

    pub fn is_equals_ignore_case_to(self, value: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Equals, value, true)
    }

    /// Field value begins with `prefix`.
    pub fn starts_with(self, prefix: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Prefix, prefix, false)
    }

    pub fn starts_with_ignore_case(self, prefix: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Prefix, prefix, true)
    }

    pub fn ends_with(self, suffix: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Suffix, suffix, false)
    }

    pub fn contains(self, needle: impl Into<String>) -> MockMatcherBuilder {
        self.text(TextCheck::Substring, needle, false)
    }

    /// Case handling is up to the pattern, e.g. `(?i)`.
    pub fn matches(self, pattern: Regex) -> MockMatcherBuilder {
        self.predicate(move |value: &str| pattern.is_match(value))
    }
}

impl HttpMethodMatcherBuilder {
    pub fn is_equals_to(self, method: HttpMethod) -> MockMatcherBuilder {
        self.predicate(move |m| *m == method)
    }

    /// Match any of `methods`.
    pub fn any(self, methods: &[HttpMethod]) -> MockMatcherBuilder {
        let methods = methods.to_vec();
        self.predicate(move |m| methods.contains(m))
    }

    /// Match every verb not in `methods`.
    pub fn not(self, methods: &[HttpMethod]) -> MockMatcherBuilder {
        let methods = methods.to_vec();
        self.predicate(move |m| !methods.contains(m))
    }
}

fn owned<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

impl MapMatcherBuilder {
    /// Exact equality, ignoring key order.
    pub fn is_equals_to<I, K, V>(self, entries: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let expected: PathParams = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.predicate(move |map| {
            map.len() == expected.len()
                && expected.iter().all(|(k, v)| map.get(k) == Some(v))
        })
    }

    /// Map holds every given entry; other entries are allowed.
    pub fn contains<I, K, V>(self, entries: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let expected: Vec<(String, String)> =
            entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self.predicate(move |map| expected.iter().all(|(k, v)| map.get(k) == Some(v)))
    }

    pub fn contains_key(self, key: impl Into<String>) -> MockMatcherBuilder {
        let key = key.into();
        self.predicate(move |map| map.contains_key(&key))
    }

    /// Every key is present.
    pub fn contains_keys<I, S>(self, keys: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = owned(keys);
        self.predicate(move |map| keys.iter().all(|k| map.contains_key(k)))
    }

    /// The key set equals `keys` exactly.
    pub fn contains_only_keys<I, S>(self, keys: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: HashSet<String> = owned(keys).into_iter().collect();
        self.predicate(move |map| {
            map.len() == keys.len() && map.keys().all(|k| keys.contains(k))
        })
    }

    pub fn contains_value(self, value: impl Into<String>) -> MockMatcherBuilder {
        let value = value.into();
        self.predicate(move |map| map.values().any(|v| *v == value))
    }

    pub fn contains_values<I, S>(self, values: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = owned(values);
        self.predicate(move |map| values.iter().all(|value| map.values().any(|v| v == value)))
    }

    pub fn is_null_or_empty(self) -> MockMatcherBuilder {
        self.predicate(|map| map.is_empty())
    }
}

/// Whether `map` holds every value listed for every key of `expected`.
fn holds_all(map: &MultiValueMap, expected: &MultiValueMap) -> bool {
    expected.iter().all(|(key, wanted)| match map.get(key) {
        Some(actual) => wanted.iter().all(|w| actual.contains(w)),
        None => false,
    })
}

impl MultiValueMapMatcherBuilder {
    /// Same keys with the same values in the same per-key order.
    pub fn is_equals_to<I, K, V>(self, entries: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let expected: MultiValueMap = entries.into_iter().collect();
        self.predicate(move |map| {
            map.len() == expected.len()
                && expected.iter().all(|(k, values)| map.get(k) == Some(values))
        })
    }

    /// Superset check: each given key is present and its values include every
    /// value listed for it. Repeating a key lists several values.
    pub fn contains<I, K, V>(self, entries: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let expected: MultiValueMap = entries.into_iter().collect();
        self.predicate(move |map| holds_all(map, &expected))
    }

    pub fn contains_key(self, key: impl Into<String>) -> MockMatcherBuilder {
        let key = key.into();
        self.predicate(move |map| map.contains_key(&key))
    }

    pub fn contains_keys<I, S>(self, keys: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = owned(keys);
        self.predicate(move |map| keys.iter().all(|k| map.contains_key(k)))
    }

    /// The key set equals `keys` exactly, honoring the map's case policy.
    pub fn contains_only_keys<I, S>(self, keys: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = owned(keys);
        self.predicate(move |map| {
            let same = |a: &str, b: &str| {
                if map.ignores_case() {
                    a.eq_ignore_ascii_case(b)
                } else {
                    a == b
                }
            };
            keys.iter().all(|k| map.contains_key(k))
                && map.keys().all(|actual| keys.iter().any(|k| same(k, actual)))
        })
    }

    /// Some key carries `value`.
    pub fn contains_value(self, value: impl Into<String>) -> MockMatcherBuilder {
        let value = value.into();
        self.predicate(move |map| map.contains_value(&value))
    }

    pub fn contains_values<I, S>(self, values: I) -> MockMatcherBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values = owned(values);
        self.predicate(move |map| values.iter().all(|v| map.contains_value(v)))
    }

    pub fn is_null_or_empty(self) -> MockMatcherBuilder {
        self.predicate(|map| map.is_empty())
    }
}

impl BodyMatcherBuilder {
    /// An absent body compares equal to JSON `null`.
    pub fn is_equals_to(self, value: Value) -> MockMatcherBuilder {
        self.predicate(move |body| body.as_ref().unwrap_or(&Value::Null) == &value)
    }

    /// No body was bound.
    pub fn is_empty(self) -> MockMatcherBuilder {
        self.predicate(|body| body.is_none())
    }
}

impl ResponseTypeMatcherBuilder {
    /// Compared against the unwrapped response type.
    pub fn is_equals_to(self, expected: TypeDescriptor) -> MockMatcherBuilder {
        self.predicate(move |ty| *ty == expected)
    }
}

//! Ordered multi-valued map used for headers and query parameters.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Ordered map from key to one-or-more string values.
///
/// Both key order and per-key value order follow insertion order. A map
/// created with [`MultiValueMap::case_insensitive`] compares keys ignoring
/// ASCII case (HTTP header semantics) while keeping the spelling of the first
/// insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "RawMultiValueMap", into = "IndexMap<String, Vec<String>>")]
pub struct MultiValueMap {
    entries: IndexMap<String, Vec<String>>,
    ignore_case: bool,
}

impl MultiValueMap {
    /// Create an empty, case-sensitive map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty map whose keys compare case-insensitively.
    pub fn case_insensitive() -> Self {
        Self {
            entries: IndexMap::new(),
            ignore_case: true,
        }
    }

    /// Whether keys are compared ignoring ASCII case.
    pub fn ignores_case(&self) -> bool {
        self.ignore_case
    }

    fn index_of(&self, key: &str) -> Option<usize> {
        if let Some(index) = self.entries.get_index_of(key) {
            return Some(index);
        }
        if self.ignore_case {
            return self
                .entries
                .keys()
                .position(|k| k.eq_ignore_ascii_case(key));
        }
        None
    }

    fn values_mut(&mut self, key: &str) -> &mut Vec<String> {
        let index = match self.index_of(key) {
            Some(index) => index,
            None => self.entries.insert_full(key.to_string(), Vec::new()).0,
        };
        &mut self.entries[index]
    }

    /// Append one value under `key`.
    pub fn add(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.values_mut(key.as_ref()).push(value.into());
    }

    /// Append every value under `key`. The key is created even when `values`
    /// is empty.
    pub fn add_all<I, S>(&mut self, key: impl AsRef<str>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values_mut(key.as_ref())
            .extend(values.into_iter().map(Into::into));
    }

    /// Merge every entry of `other` into this map, appending values.
    pub fn merge(&mut self, other: &MultiValueMap) {
        for (key, values) in other.iter() {
            self.add_all(key, values.iter().cloned());
        }
    }

    /// Values stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.index_of(key).map(|i| self.entries[i].as_slice())
    }

    /// First value stored under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_some()
    }

    /// Whether any key holds `value`.
    pub fn contains_value(&self, value: &str) -> bool {
        self.entries.values().any(|values| values.iter().any(|v| v == value))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl MultiValueMap {
    /// Whether every entry of `self` has an equal entry in `other`, keys
    /// folded when `fold` is set.
    fn covered_by(&self, other: &Self, fold: bool) -> bool {
        self.iter().all(|(key, values)| {
            other.iter().any(|(other_key, other_values)| {
                let same_key = if fold {
                    key.eq_ignore_ascii_case(other_key)
                } else {
                    key == other_key
                };
                same_key && values == other_values
            })
        })
    }
}

/// Keys are folded when either side ignores case.
impl PartialEq for MultiValueMap {
    fn eq(&self, other: &Self) -> bool {
        let fold = self.ignore_case || other.ignore_case;
        self.len() == other.len() && self.covered_by(other, fold) && other.covered_by(self, fold)
    }
}

impl Eq for MultiValueMap {}

impl<K, V> FromIterator<(K, V)> for MultiValueMap
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = MultiValueMap::new();
        for (key, value) in iter {
            map.add(key, value);
        }
        map
    }
}

impl From<MultiValueMap> for IndexMap<String, Vec<String>> {
    fn from(map: MultiValueMap) -> Self {
        map.entries
    }
}

/// Deserialize a header map: same wire form, keys compared ignoring case.
pub fn deserialize_headers<'de, D>(deserializer: D) -> Result<MultiValueMap, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = MultiValueMap::deserialize(deserializer)?;
    let mut headers = MultiValueMap::case_insensitive();
    headers.merge(&raw);
    Ok(headers)
}

/// Serialized form: each value is either a single string or a list.
#[derive(Deserialize)]
struct RawMultiValueMap(IndexMap<String, OneOrMany>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<RawMultiValueMap> for MultiValueMap {
    fn from(raw: RawMultiValueMap) -> Self {
        let mut map = MultiValueMap::new();
        for (key, values) in raw.0 {
            match values {
                OneOrMany::One(v) => map.add(key, v),
                OneOrMany::Many(vs) => map.add_all(key, vs),
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_preserves_key_and_value_order() {
        let mut map = MultiValueMap::new();
        map.add("b", "1");
        map.add("a", "2");
        map.add("b", "3");

        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.get("b").unwrap(), &["1".to_string(), "3".to_string()]);
        assert_eq!(map.first("a"), Some("2"));
    }

    #[test]
    fn test_case_insensitive_keys() {
        let mut headers = MultiValueMap::case_insensitive();
        headers.add("Content-Type", "application/json");
        headers.add("content-type", "text/plain");

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key("CONTENT-TYPE"));
        assert_eq!(headers.keys().next(), Some("Content-Type"));
        assert_eq!(headers.get("content-type").unwrap().len(), 2);
    }

    #[test]
    fn test_case_sensitive_keys() {
        let mut query = MultiValueMap::new();
        query.add("page", "1");
        assert!(!query.contains_key("Page"));
    }

    #[test]
    fn test_add_all_with_no_values_creates_key() {
        let mut map = MultiValueMap::new();
        map.add_all("tags", Vec::<String>::new());
        assert!(map.contains_key("tags"));
        assert_eq!(map.get("tags").unwrap().len(), 0);
    }

    #[test]
    fn test_merge_appends() {
        let mut left: MultiValueMap = [("X", "1")].into_iter().collect();
        let right: MultiValueMap = [("X", "2"), ("Y", "3")].into_iter().collect();
        left.merge(&right);

        assert_eq!(left.get("X").unwrap(), &["1".to_string(), "2".to_string()]);
        assert_eq!(left.first("Y"), Some("3"));
    }

    #[test]
    fn test_equality_ignores_key_order() {
        let a: MultiValueMap = [("a", "1"), ("b", "2")].into_iter().collect();
        let b: MultiValueMap = [("b", "2"), ("a", "1")].into_iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_is_symmetric_across_case_policies() {
        let mut headers = MultiValueMap::case_insensitive();
        headers.add("Accept", "x");
        let plain: MultiValueMap = [("accept", "x")].into_iter().collect();

        assert_eq!(headers, plain);
        assert_eq!(plain, headers);

        let other: MultiValueMap = [("accept", "y")].into_iter().collect();
        assert_ne!(headers, other);
        assert_ne!(other, headers);
    }

    #[test]
    fn test_equality_case_sensitive_maps_keep_case() {
        let a: MultiValueMap = [("Accept", "x")].into_iter().collect();
        let b: MultiValueMap = [("accept", "x")].into_iter().collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_deserialize_headers_ignores_case() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[serde(deserialize_with = "deserialize_headers")]
            headers: MultiValueMap,
        }
        let wrapper: Wrapper =
            serde_json::from_str(r#"{"headers": {"Content-Type": "text/plain", "content-type": "a"}}"#)
                .unwrap();

        assert!(wrapper.headers.ignores_case());
        assert_eq!(wrapper.headers.len(), 1);
        assert_eq!(wrapper.headers.get("CONTENT-TYPE").map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_deserialize_single_and_list_values() {
        let json = r#"{"X-One": "1", "X-Many": ["a", "b"]}"#;
        let map: MultiValueMap = serde_json::from_str(json).unwrap();

        assert_eq!(map.first("X-One"), Some("1"));
        assert_eq!(map.get("X-Many").unwrap().len(), 2);
        assert!(map.contains_value("b"));
    }
}

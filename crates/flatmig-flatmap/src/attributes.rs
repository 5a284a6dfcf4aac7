//! Flattened attribute maps
//!
//! [`AttributeMap`] is the persisted form of a resource's state: every leaf
//! of the nested structure lives under a dotted key, and every collection
//! carries a `<field>.#` count.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::path::{FieldPath, COUNT_SEGMENT};

/// Dotted-key → string-value map
///
/// Backed by a [`BTreeMap`], so iteration is always in ascending key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, String>);

impl AttributeMap {
    /// Create new empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get value stored under `key`
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Check whether `key` is present
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Insert a value, returning the one it replaced
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a single key
    #[inline]
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Number of stored keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map holds no keys at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys starting with `prefix`, in key order
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.as_str())
    }

    /// Distinct element addresses stored under the collection at `path`
    ///
    /// An address is the segment right after `path.`: a list index or a set
    /// hash code. The `#` count marker is not an address.
    #[must_use]
    pub fn element_addresses(&self, path: &FieldPath) -> BTreeSet<&str> {
        let prefix = path.prefix();
        self.0
            .range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(prefix.as_str()))
            .filter_map(|(k, _)| k[prefix.len()..].split('.').next())
            .filter(|address| !address.is_empty() && *address != COUNT_SEGMENT)
            .collect()
    }

    /// Remove every key starting with `prefix`
    ///
    /// Returns the number of keys removed. Absence of matches is not an
    /// error.
    pub fn remove_prefix(&mut self, prefix: &str) -> usize {
        let doomed: Vec<String> = self.keys_with_prefix(prefix).map(str::to_string).collect();
        for key in &doomed {
            self.0.remove(key);
        }
        doomed.len()
    }

    /// Merge `other` into this map, overwriting on collision
    ///
    /// Returns the number of keys that were overwritten.
    pub fn merge(&mut self, other: AttributeMap) -> usize {
        let mut overwritten = 0;
        for (k, v) in other.0 {
            if self.0.insert(k, v).is_some() {
                overwritten += 1;
            }
        }
        overwritten
    }

    /// Raw count stored at `<path>.#`, if any
    #[inline]
    #[must_use]
    pub fn count(&self, path: &FieldPath) -> Option<&str> {
        self.get(&path.count_key())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AttributeMap {
        [
            ("cache_behavior.#", "1"),
            ("cache_behavior.12.path_pattern", "/a"),
            ("cache_behavior_extra", "x"),
            ("comment", "hi"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn keys_with_prefix_is_exact() {
        let map = sample();
        let keys: Vec<_> = map.keys_with_prefix("cache_behavior.").collect();
        assert_eq!(keys, vec!["cache_behavior.#", "cache_behavior.12.path_pattern"]);
    }

    #[test]
    fn remove_prefix_leaves_siblings() {
        let mut map = sample();
        assert_eq!(map.remove_prefix("cache_behavior."), 2);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("cache_behavior_extra"));
        assert_eq!(map.remove_prefix("nothing."), 0);
    }

    #[test]
    fn merge_overwrites() {
        let mut map = sample();
        let other: AttributeMap = [("comment", "bye"), ("new", "1")].into_iter().collect();
        assert_eq!(map.merge(other), 1);
        assert_eq!(map.get("comment"), Some("bye"));
        assert_eq!(map.get("new"), Some("1"));
    }

    #[test]
    fn element_addresses_skip_count_marker() {
        let map = sample();
        let addresses = map.element_addresses(&FieldPath::single("cache_behavior"));
        assert_eq!(addresses.into_iter().collect::<Vec<_>>(), vec!["12"]);
        assert!(map.element_addresses(&FieldPath::single("comment")).is_empty());
    }

    #[test]
    fn serde_is_plain_object() {
        let map: AttributeMap = [("a.#", "0")].into_iter().collect();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r##"{"a.#":"0"}"##);
        let back: AttributeMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

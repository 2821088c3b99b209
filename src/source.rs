//! Normalized source mapping.
//!
//! A flat source (typically the process environment) is normalized once per
//! load: every key goes through the selected case transform, so lookups by
//! composed key are stable whatever casing the producer used.

use indexmap::IndexMap;

use crate::case::KeyTransform;
use crate::value::Value;

/// Flat mapping from normalized key to raw value.
///
/// Keys are unique after normalization. When two raw keys normalize to the
/// same key, the one enumerated last wins; the collision is accepted rather
/// than reported, so the enumeration order of the input decides the outcome.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    values: IndexMap<String, Value>,
}

impl SourceMap {
    /// Create an empty mapping.
    pub fn empty() -> Self {
        Self {
            values: IndexMap::new(),
        }
    }

    /// Normalize a flat source with the given transform.
    ///
    /// `Value::Undefined` entries are kept, so a present-but-unset key still
    /// shadows nothing and lets schema defaults apply downstream.
    pub fn normalize<I, K, V>(source: I, transform: KeyTransform) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut values = IndexMap::new();
        for (key, value) in source {
            let normalized = transform(key.as_ref());
            // Re-inserting keeps the first slot but takes the later value.
            values.insert(normalized, value.into());
        }
        Self { values }
    }

    /// Insert a value under an already-normalized key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a normalized key.
    ///
    /// A present key holding `Value::Undefined` reads as absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key).filter(|v| !v.is_undefined())
    }

    /// Check whether a normalized key is present, defined or not.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of normalized keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over normalized key-value pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// All normalized keys.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{to_camel_case, to_snake_case};

    #[test]
    fn test_normalize_applies_transform_to_every_key() {
        let map = SourceMap::normalize(
            [("DATABASE_POOL_SIZE", "9"), ("foobar-token", "token")],
            to_camel_case,
        );

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("databasePoolSize"), Some(&Value::from("9")));
        assert_eq!(map.get("foobarToken"), Some(&Value::from("token")));
        assert!(map.get("DATABASE_POOL_SIZE").is_none());
    }

    #[test]
    fn test_normalize_last_write_wins() {
        let map = SourceMap::normalize(
            [("FOO_BAR", "first"), ("foo-bar", "second"), ("fooBar", "third")],
            to_camel_case,
        );

        assert_eq!(map.len(), 1);
        assert_eq!(map.get("fooBar"), Some(&Value::from("third")));
    }

    #[test]
    fn test_normalize_order_decides_collision() {
        let map = SourceMap::normalize([("fooBar", "b"), ("FOO_BAR", "a")], to_snake_case);
        assert_eq!(map.get("foo_bar"), Some(&Value::from("a")));
    }

    #[test]
    fn test_undefined_kept_but_reads_as_absent() {
        let map = SourceMap::normalize(
            vec![("unset", Value::Undefined), ("zero", Value::Integer(0))],
            to_camel_case,
        );

        assert!(map.contains("unset"));
        assert!(map.get("unset").is_none());
        assert_eq!(map.get("zero"), Some(&Value::Integer(0)));
    }

    #[test]
    fn test_falsy_values_are_found() {
        let map = SourceMap::normalize(
            vec![
                ("isEnabled", Value::Bool(false)),
                ("count", Value::Integer(0)),
                ("name", Value::from("")),
            ],
            to_camel_case,
        );

        assert_eq!(map.get("isEnabled"), Some(&Value::Bool(false)));
        assert_eq!(map.get("count"), Some(&Value::Integer(0)));
        assert_eq!(map.get("name"), Some(&Value::from("")));
    }

    #[test]
    fn test_insert_and_iterate() {
        let mut map = SourceMap::empty();
        assert!(map.is_empty());
        map.insert("a", 1);
        map.insert("b", true);

        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.iter().count(), 2);
    }
}

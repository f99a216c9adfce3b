use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered JSON object used for node result maps, stats and payloads.
///
/// Keys keep insertion order (serde_json map), lookups are by name,
/// last write wins per key.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Vars(Map<String, Value>);

impl Vars {
    /// Allocate an empty [`Vars`].
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a key to a value, converting anything serializable to JSON.
    pub fn set<K, V>(
        &mut self,
        key: K,
        value: V,
    ) where
        K: Into<String>,
        V: Into<Value>,
    {
        self.0.insert(key.into(), value.into());
    }

    /// Get the raw JSON value under `key`.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize the value under `key` into `T`.
    ///
    /// Returns `None` when the key is absent, null, or does not
    /// deserialize into `T`.
    pub fn get_as<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<T> {
        match self.0.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => serde_json::from_value(value.clone()).ok(),
        }
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` entries in insertion order.
    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.0.iter()
    }
}

impl fmt::Display for Vars {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}", Value::Object(self.0.clone()))
    }
}

impl From<Vars> for Value {
    fn from(vars: Vars) -> Self {
        Value::Object(vars.0)
    }
}

impl From<Value> for Vars {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self(Map::new()),
        }
    }
}

impl FromIterator<(String, Value)> for Vars {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut vars = Vars::new();
        vars.set("message", "hello");
        vars.set("count", 42);

        assert_eq!(vars.get("message"), Some(&json!("hello")));
        assert_eq!(vars.get_as::<i64>("count"), Some(42));
        assert_eq!(vars.get("missing"), None);
    }

    #[test]
    fn test_last_write_wins() {
        let mut vars = Vars::new();
        vars.set("key", "first");
        vars.set("key", "second");

        assert_eq!(vars.get_as::<String>("key").as_deref(), Some("second"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn test_null_reads_as_absent() {
        let mut vars = Vars::new();
        vars.set("key", Value::Null);

        assert!(vars.contains_key("key"));
        assert_eq!(vars.get_as::<String>("key"), None);
    }

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut vars = Vars::new();
        vars.set("zebra", 1);
        vars.set("apple", 2);
        vars.set("mango", 3);

        let keys: Vec<&str> = vars.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn test_from_non_object_value_is_empty() {
        let vars: Vars = json!([1, 2, 3]).into();
        assert!(vars.is_empty());
    }
}

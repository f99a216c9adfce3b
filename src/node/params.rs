//! Parameter resolution.
//!
//! Every node resolves its effective parameters through the one generic
//! resolver here instead of per-node lookup chains. Resolution order is
//! fixed: inputs first, contents second, explicit default last. A null
//! value, or a value that does not deserialize into the requested type,
//! falls through to the next source.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// One named value flowing into a node, either from an upstream node
/// (`inputs`) or from the node's own configured fields (`contents`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PortValue {
    pub name: String,
    pub value: Value,
}

impl PortValue {
    pub fn new<N: Into<String>, V: Into<Value>>(
        name: N,
        value: V,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

fn lookup<'a>(
    name: &str,
    values: &'a [PortValue],
) -> Option<&'a Value> {
    values.iter().find(|port| port.name == name).map(|port| &port.value).filter(|value| !value.is_null())
}

/// Resolve `name` as a `T`, inputs before contents.
pub fn resolve<T: DeserializeOwned>(
    name: &str,
    inputs: &[PortValue],
    contents: &[PortValue],
) -> Option<T> {
    lookup(name, inputs)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .or_else(|| lookup(name, contents).and_then(|value| serde_json::from_value(value.clone()).ok()))
}

/// Resolve `name`, falling back to `default` when neither source has a
/// usable value.
pub fn resolve_or<T: DeserializeOwned>(
    name: &str,
    inputs: &[PortValue],
    contents: &[PortValue],
    default: T,
) -> T {
    resolve(name, inputs, contents).unwrap_or(default)
}

/// Resolve `name` as text. The empty string counts as absent, so a
/// cleared prompt field short-circuits the same way a missing one does.
pub fn resolve_text(
    name: &str,
    inputs: &[PortValue],
    contents: &[PortValue],
) -> Option<String> {
    resolve::<String>(name, inputs, contents).filter(|text| !text.trim().is_empty())
}

/// Resolve `name` as raw JSON without a type constraint.
pub fn resolve_value(
    name: &str,
    inputs: &[PortValue],
    contents: &[PortValue],
) -> Option<Value> {
    lookup(name, inputs).or_else(|| lookup(name, contents)).cloned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    // ==================== precedence tests ====================

    #[test]
    fn test_inputs_take_precedence_over_contents() {
        let inputs = vec![PortValue::new("Text", "from input")];
        let contents = vec![PortValue::new("Text", "from field")];

        let resolved: Option<String> = resolve("Text", &inputs, &contents);
        assert_eq!(resolved.as_deref(), Some("from input"));
    }

    #[test]
    fn test_null_input_falls_through_to_contents() {
        let inputs = vec![PortValue::new("Text", Value::Null)];
        let contents = vec![PortValue::new("Text", "from field")];

        let resolved: Option<String> = resolve("Text", &inputs, &contents);
        assert_eq!(resolved.as_deref(), Some("from field"));
    }

    #[test]
    fn test_default_applies_last() {
        let resolved = resolve_or("Count", &[], &[], 7i64);
        assert_eq!(resolved, 7);

        let contents = vec![PortValue::new("Count", 3)];
        let resolved = resolve_or("Count", &[], &contents, 7i64);
        assert_eq!(resolved, 3);
    }

    // ==================== type handling tests ====================

    #[test]
    fn test_malformed_value_falls_through() {
        let inputs = vec![PortValue::new("Count", "not a number")];
        let contents = vec![PortValue::new("Count", 5)];

        let resolved: Option<i64> = resolve("Count", &inputs, &contents);
        assert_eq!(resolved, Some(5));
    }

    #[test]
    fn test_resolve_text_treats_blank_as_absent() {
        let contents = vec![PortValue::new("Prompt", "   ")];
        assert_eq!(resolve_text("Prompt", &[], &contents), None);

        let contents = vec![PortValue::new("Prompt", "a sunset")];
        assert_eq!(resolve_text("Prompt", &[], &contents).as_deref(), Some("a sunset"));
    }

    #[test]
    fn test_resolve_value_keeps_structure() {
        let inputs = vec![PortValue::new("jsons", json!({"a": 1}))];
        assert_eq!(resolve_value("jsons", &inputs, &[]), Some(json!({"a": 1})));
    }

    #[test]
    fn test_missing_everywhere_is_none() {
        let resolved: Option<String> = resolve("Missing", &[], &[]);
        assert_eq!(resolved, None);
    }
}

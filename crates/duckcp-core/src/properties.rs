//! Helpers for the JSON property bags stored on repositories and storages.

use serde_json::{Map, Value as JsonValue};

/// A value counts as present unless it is null, an empty string or an empty list.
pub fn is_present(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        _ => true,
    }
}

/// Drops keys whose value is not present. `false` and `0` are kept.
pub fn prune(properties: Map<String, JsonValue>) -> Map<String, JsonValue> {
    properties
        .into_iter()
        .filter(|(_, value)| is_present(value))
        .collect()
}

/// Overlays supplied properties on stored ones.
///
/// A supplied `null` means the key was not given and leaves the stored value alone.
/// A supplied empty string or empty list survives the merge so that [`prune`]
/// removes the key afterwards.
pub fn merge(stored: &JsonValue, supplied: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    let mut merged = stored.as_object().cloned().unwrap_or_default();
    for (key, value) in supplied {
        if !value.is_null() {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Returns true when at least one supplied value is not null.
pub fn any_supplied(supplied: &Map<String, JsonValue>) -> bool {
    supplied.values().any(|value| !value.is_null())
}

pub fn get_str<'a>(properties: &'a JsonValue, key: &str) -> Option<&'a str> {
    properties
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|s| !s.is_empty())
}

/// Reads a property as text, rendering numbers and booleans.
pub fn get_string(properties: &JsonValue, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_prune_keeps_false_and_zero() {
        let pruned = prune(object(json!({
            "a": null,
            "b": "",
            "c": [],
            "d": false,
            "e": 0,
            "f": "x"
        })));
        assert_eq!(JsonValue::Object(pruned), json!({"d": false, "e": 0, "f": "x"}));
    }

    #[test]
    fn test_merge_null_is_not_supplied() {
        let stored = json!({"file": "/a.db", "header": true});
        let merged = merge(&stored, &object(json!({"file": null, "header": false})));
        assert_eq!(JsonValue::Object(merged), json!({"file": "/a.db", "header": false}));
    }

    #[test]
    fn test_merge_empty_string_clears() {
        let stored = json!({"table": "t", "schema": "s"});
        let merged = prune(merge(&stored, &object(json!({"schema": ""}))));
        assert_eq!(JsonValue::Object(merged), json!({"table": "t"}));
    }

    #[test]
    fn test_any_supplied() {
        assert!(!any_supplied(&object(json!({"a": null}))));
        assert!(any_supplied(&object(json!({"a": null, "b": false}))));
    }

    #[test]
    fn test_get_string() {
        let props = json!({"host": "db", "port": 5432, "empty": ""});
        assert_eq!(get_str(&props, "host"), Some("db"));
        assert_eq!(get_str(&props, "empty"), None);
        assert_eq!(get_string(&props, "port").as_deref(), Some("5432"));
    }
}

//! Helpers for pulling typed fields out of untyped JSON maps

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Non-blank string value under `key`, trimmed
pub(crate) fn get_str(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Boolean value under `key`, accepting common textual spellings
pub(crate) fn get_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "是" | "安全" => Some(true),
            "false" | "no" | "否" | "不安全" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Non-blank string elements of an array under `key`
pub(crate) fn get_string_list(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let array = map.get(key)?.as_array()?;
    let items: Vec<String> = array
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    Some(items)
}

/// Object under `key` flattened into string key/value pairs
///
/// Scalars stringify, nested objects serialize to JSON, arrays join with
/// `", "`. Blank values are dropped.
pub(crate) fn get_fact_map(map: &Map<String, Value>, key: &str) -> Option<HashMap<String, String>> {
    let object = map.get(key)?.as_object()?;
    Some(flatten_facts(object))
}

/// Flatten an arbitrary JSON object into string facts
pub(crate) fn flatten_facts(object: &Map<String, Value>) -> HashMap<String, String> {
    let mut facts = HashMap::new();
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            Value::Null => String::new(),
        };
        if !text.is_empty() {
            facts.insert(key.clone(), text);
        }
    }
    facts
}

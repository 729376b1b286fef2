//! Canonical JSON rendering for cache keys.

use serde_json::Value;

/// Render a payload as canonical JSON: object keys sorted recursively,
/// no insignificant whitespace.
///
/// Two payloads that differ only in key order produce the same string, so
/// the session cache treats them as the same action.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    render(value)
}

fn render(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .filter_map(|k| {
                    map.get(k)
                        .map(|v| format!("{}:{}", Value::String(k.clone()), render(v)))
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render).collect();
            format!("[{}]", rendered.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_is_irrelevant() {
        let a: Value = serde_json::from_str(r#"{"b": 1, "a": {"y": 2, "x": 3}}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"a": {"x": 3, "y": 2}, "b": 1}"#).unwrap();
        assert_eq!(canonical_json(&a), canonical_json(&b));
    }

    #[test]
    fn test_array_order_is_significant() {
        assert_ne!(canonical_json(&json!([1, 2])), canonical_json(&json!([2, 1])));
    }

    #[test]
    fn test_scalars() {
        assert_eq!(canonical_json(&json!("hi")), "\"hi\"");
        assert_eq!(canonical_json(&json!(2)), "2");
        assert_eq!(canonical_json(&json!(null)), "null");
    }
}

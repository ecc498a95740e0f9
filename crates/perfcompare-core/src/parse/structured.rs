use serde_json::Value;

use crate::row::{Row, RowSequence};

/// Parse a JSON document that must be a top-level array of objects.
pub fn parse_json_str(content: &str) -> Result<RowSequence, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(format!(
                "expected a top-level array of objects, found {}",
                kind(&other)
            ))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(object) => Ok(Row::from_json_object(object)),
            other => Err(format!(
                "element {i} is {}, expected an object",
                kind(other)
            )),
        })
        .collect()
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_of_objects_becomes_rows() {
        let rows = parse_json_str(
            r#"[{"host": "web-1", "cpu_pct": 41.5}, {"host": "web-2", "mem_mb": 2048}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("host"), Some("web-1"));
        assert_eq!(rows[0].get("cpu_pct"), Some("41.5"));
        assert_eq!(rows[1].get("mem_mb"), Some("2048"));
    }

    #[test]
    fn object_key_order_is_kept() {
        let rows =
            parse_json_str(r#"[{"timestamp": "t", "host": "web-1", "cpu": "40"}]"#).unwrap();
        let keys: Vec<&str> = rows[0].keys().collect();
        assert_eq!(keys, vec!["timestamp", "host", "cpu"]);
        assert_eq!(rows[1].get("cpu_pct"), None);
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_json_str("[]").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = parse_json_str("{not json").unwrap_err();
        assert!(err.starts_with("invalid JSON"));
    }

    #[test]
    fn top_level_object_is_rejected() {
        let err = parse_json_str(r#"{"results": []}"#).unwrap_err();
        assert!(err.contains("found an object"));
    }

    #[test]
    fn non_object_element_is_rejected() {
        let err = parse_json_str(r#"[{"a": 1}, 2]"#).unwrap_err();
        assert_eq!(err, "element 1 is a number, expected an object");
    }
}

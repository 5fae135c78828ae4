//! JSON text resolution
//!
//! Explicit field paths and known-field search.

use serde_json::Value;

/// Field names tried, in priority order, when no field path is configured.
pub const JSON_TEXT_FIELDS: [&str; 6] = [
    "text",
    "content",
    "transcript",
    "value",
    "description",
    "body",
];

/// Resolve a dot-separated path such as `content.text` or `segments.0.text`.
///
/// Array elements are addressed by numeric segments. Returns the segment
/// that could not be resolved on failure.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Result<&'a Value, String> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(obj) => obj
                .get(segment)
                .ok_or_else(|| format!("field '{segment}' not found in path '{path}'"))?,
            Value::Array(arr) => {
                let index: usize = segment.parse().map_err(|_| {
                    format!("segment '{segment}' in path '{path}' is not an array index")
                })?;
                arr.get(index).ok_or_else(|| {
                    format!("index {index} out of bounds in path '{path}' (len {})", arr.len())
                })?
            }
            _ => {
                return Err(format!(
                    "cannot traverse into '{segment}' in path '{path}': not an object or array"
                ))
            }
        };
    }
    Ok(current)
}

/// Extract the string at `path`.
pub fn text_at_path(value: &Value, path: &str) -> Result<String, String> {
    match resolve_path(value, path)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(format!(
            "field path '{path}' resolves to {}, not a string",
            kind_name(other)
        )),
    }
}

/// Depth-first search for the first string-valued known field.
///
/// At every object the candidate names are tried in priority order before
/// descending into children (object keys in document order, arrays by index).
pub fn find_known_text(value: &Value) -> Option<&str> {
    match value {
        Value::Object(obj) => {
            for field in JSON_TEXT_FIELDS {
                if let Some(Value::String(s)) = obj.get(field) {
                    return Some(s);
                }
            }
            obj.values().find_map(find_known_text)
        }
        Value::Array(arr) => arr.iter().find_map(find_known_text),
        _ => None,
    }
}

fn kind_name(value: &Value) -> &'static str {
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
    use serde_json::json;

    #[test]
    fn test_resolve_nested_path() {
        let doc = json!({"content": {"text": "hello there"}});
        assert_eq!(text_at_path(&doc, "content.text").unwrap(), "hello there");
    }

    #[test]
    fn test_resolve_array_index() {
        let doc = json!({"segments": [{"text": "first"}, {"text": "second"}]});
        assert_eq!(text_at_path(&doc, "segments.1.text").unwrap(), "second");
        assert!(text_at_path(&doc, "segments.5.text").is_err());
        assert!(text_at_path(&doc, "segments.x.text").is_err());
    }

    #[test]
    fn test_missing_key_and_non_string() {
        let doc = json!({"content": {"body": "x", "n": 3}});
        let err = text_at_path(&doc, "content.text").unwrap_err();
        assert!(err.contains("'text'"));
        assert!(text_at_path(&doc, "content.n").unwrap_err().contains("a number"));
        assert!(text_at_path(&doc, "content.body.deeper").is_err());
    }

    #[test]
    fn test_known_fields_priority_order() {
        let doc = json!({"body": "from body", "content": "from content"});
        assert_eq!(find_known_text(&doc), Some("from content"));
    }

    #[test]
    fn test_known_fields_depth_first() {
        let doc = json!({
            "meta": {"id": 7},
            "items": [{"title": "none"}, {"transcript": "spoken words"}]
        });
        assert_eq!(find_known_text(&doc), Some("spoken words"));
    }

    #[test]
    fn test_known_fields_follow_document_order() {
        let doc: Value = serde_json::from_str(
            r#"{"zeta": {"text": "first in document"}, "alpha": {"text": "second in document"}}"#,
        )
        .unwrap();
        assert_eq!(find_known_text(&doc), Some("first in document"));
    }

    #[test]
    fn test_known_fields_skip_non_strings() {
        let doc = json!({"text": 42, "nested": {"value": "found"}});
        assert_eq!(find_known_text(&doc), Some("found"));
        assert_eq!(find_known_text(&json!({"title": "x"})), None);
    }
}

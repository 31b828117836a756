//! JSON and text export decoding
//!
//! Strict JSON parse: an array yields one record per element, any other
//! value yields a single record. Unparseable input is wrapped as
//! `{"content": <text>}` rather than failing, so raw text exports are
//! still staged for manual review.

use super::ParsedRecord;
use serde_json::{json, Value};

pub fn parse(raw: &[u8]) -> Vec<ParsedRecord> {
    let text = String::from_utf8_lossy(raw);

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(items)) => items.into_iter().map(ParsedRecord::ok).collect(),
        Ok(value) => vec![ParsedRecord::ok(value)],
        Err(_) => vec![ParsedRecord::ok(json!({ "content": text }))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_yields_one_record_per_element() {
        let records = parse(br#"[{"a": 1}, {"a": 2}, {"a": 3}]"#);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].payload["a"], 2);
        assert!(records.iter().all(|r| r.error.is_none()));
    }

    #[test]
    fn test_single_object_yields_one_record() {
        let records = parse(br#"{"name": "Jane"}"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["name"], "Jane");
    }

    #[test]
    fn test_invalid_json_wrapped_as_content() {
        let records = parse(b"just some notes\nsecond line");
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].payload["content"],
            "just some notes\nsecond line"
        );
        assert!(records[0].error.is_none());
    }

    #[test]
    fn test_empty_array_yields_no_records() {
        assert!(parse(b"[]").is_empty());
    }
}

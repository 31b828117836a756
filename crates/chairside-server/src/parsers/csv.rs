//! CSV export decoding
//!
//! The first row supplies field names. Values are trimmed and blank
//! lines skipped. A malformed row becomes an individual record carrying
//! a parse-error marker; one bad row never aborts the file.

use super::ParsedRecord;
use serde_json::{json, Map, Value};

pub fn parse(raw: &[u8]) -> Vec<ParsedRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(raw);

    let headers: Vec<String> = match reader.headers() {
        Ok(h) => h.iter().map(|s| s.to_string()).collect(),
        Err(e) => {
            return vec![ParsedRecord::with_error(
                json!({}),
                format!("invalid header row: {}", e),
            )]
        },
    };

    let mut records = Vec::new();

    for row in reader.records() {
        match row {
            Ok(row) => {
                if row.iter().all(|field| field.is_empty()) {
                    continue;
                }

                if row.len() != headers.len() {
                    records.push(ParsedRecord::with_error(
                        json!({ "raw": row.iter().collect::<Vec<_>>().join(",") }),
                        format!("expected {} fields, found {}", headers.len(), row.len()),
                    ));
                    continue;
                }

                let mut payload = Map::new();
                for (header, field) in headers.iter().zip(row.iter()) {
                    payload.insert(header.clone(), Value::String(field.to_string()));
                }
                records.push(ParsedRecord::ok(Value::Object(payload)));
            },
            Err(e) => {
                records.push(ParsedRecord::with_error(json!({}), e.to_string()));
            },
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_row_becomes_field_names() {
        let records = parse(b"firstName,lastName\nJane,Doe\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["firstName"], "Jane");
        assert_eq!(records[0].payload["lastName"], "Doe");
        assert!(records[0].error.is_none());
    }

    #[test]
    fn test_values_are_trimmed() {
        let records = parse(b"name , city \n  Jane ,  Austin \n");
        assert_eq!(records[0].payload["name"], "Jane");
        assert_eq!(records[0].payload["city"], "Austin");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let records = parse(b"a,b\n1,2\n\n\n3,4\n");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_short_row_carries_error_marker() {
        let records = parse(b"a,b,c\n1,2,3\n1,2\n4,5,6\n");
        assert_eq!(records.len(), 3);
        assert!(records[0].error.is_none());
        assert!(records[1].error.is_some());
        assert_eq!(records[1].payload["raw"], "1,2");
        assert!(records[2].error.is_none());
    }

    #[test]
    fn test_empty_input_yields_no_records() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"a,b\n").is_empty());
    }
}

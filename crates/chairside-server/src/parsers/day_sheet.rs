//! Day-sheet ledger parser for Dentrix PDF exports
//!
//! Day sheets are print-formatted ledgers with one transaction per
//! logical line. PDF text extraction wraps entries across physical
//! lines, so parsing happens in two passes: reassemble logical lines
//! (a leading date token starts a new one), then pull fields out of
//! each logical line working inward from both ends.
//!
//! Every extraction step is a pure function over an immutable input
//! that returns the extracted value and the remaining text. Fields that
//! cannot be found are left null; the line is still emitted with its
//! raw text so nothing is ever dropped.

use super::ParsedRecord;
use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

/// Report boilerplate discarded during logical-line assembly, matched
/// by literal prefix.
const BOILERPLATE_PREFIXES: &[&str] = &["DAY SHEET", "Date:Page:", "DatePatient Name", "Audit #"];

static LEADING_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}").unwrap());
static TRAILING_PHONE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(.*?\)$").unwrap());
static TRAILING_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\S+)$").unwrap());
static TRAILING_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{1,2})$").unwrap());
static DOLLAR_AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-?[\d,]+\.\d{2}").unwrap());
static TOOTH_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s(\d{1,2})\s").unwrap());
static PROCEDURE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z][A-Z0-9]+").unwrap());
static SEGMENT_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Parse extracted day-sheet text into one record per ledger entry
pub fn parse(text: &str) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    let mut current: Option<String> = None;

    for line in text.lines() {
        if line.trim().is_empty()
            || BOILERPLATE_PREFIXES.iter().any(|p| line.starts_with(p))
        {
            continue;
        }

        if LEADING_DATE.is_match(line) {
            if let Some(logical) = current.take() {
                records.push(parse_ledger_line(&logical));
            }
            current = Some(line.to_string());
        } else {
            // Continuation of a wrapped entry; content seen before any
            // dated line is collected too, and surfaces as an
            // unclassified record rather than disappearing.
            match current {
                Some(ref mut logical) => {
                    logical.push(' ');
                    logical.push_str(line.trim());
                },
                None => current = Some(line.trim().to_string()),
            }
        }
    }

    if let Some(logical) = current {
        records.push(parse_ledger_line(&logical));
    }

    records
}

/// Parse one assembled logical line
///
/// Extraction order works inward from both ends: date from the left,
/// then phone, provider, and business-type code from the right, then
/// amounts, tooth, and procedure code, with the leftover text split
/// into patient name and description. The true column grid cannot be
/// recovered from extracted text, so missing tokens yield nulls rather
/// than rejecting the line.
fn parse_ledger_line(line: &str) -> ParsedRecord {
    let Some((date, rest)) = take_leading_date(line) else {
        return ParsedRecord::with_error(
            json!({ "raw": line }),
            "line does not start with a date token",
        );
    };

    let (phone, rest) = take_trailing_phone(&rest);
    let (provider, rest) = take_trailing_provider(&rest);
    let (business_type, rest) = take_trailing_business_type(&rest);
    let (charges, payments, rest) = take_amounts(&rest);
    let (tooth, rest) = take_tooth(&rest);
    let (code, rest) = take_procedure_code(&rest);
    let (patient_name, description) = split_name_description(&rest);

    ParsedRecord::ok(json!({
        "date": date,
        "patientName": patient_name,
        "tooth": tooth,
        "code": code,
        "description": description,
        "charges": charges,
        "payments": payments,
        "bt": business_type,
        "provider": provider,
        "phone": phone,
        "raw": line,
    }))
}

/// Fixed-width date token: the first ten characters of a dated line
fn take_leading_date(line: &str) -> Option<(String, String)> {
    if !LEADING_DATE.is_match(line) || line.len() < 10 {
        return None;
    }
    let (date, rest) = line.split_at(10);
    Some((date.to_string(), rest.trim().to_string()))
}

/// Trailing parenthesized phone number, e.g. `(619-555-0123)`
fn take_trailing_phone(rest: &str) -> (Option<String>, String) {
    match TRAILING_PHONE.find(rest) {
        Some(m) => (
            Some(m.as_str().to_string()),
            rest[..m.start()].trim().to_string(),
        ),
        None => (None, rest.to_string()),
    }
}

/// Trailing single-token provider code
fn take_trailing_provider(rest: &str) -> (Option<String>, String) {
    match TRAILING_TOKEN.find(rest) {
        Some(m) => (
            Some(m.as_str().to_string()),
            rest[..m.start()].trim().to_string(),
        ),
        None => (None, rest.to_string()),
    }
}

/// Trailing one- or two-digit business-type code
fn take_trailing_business_type(rest: &str) -> (Option<String>, String) {
    match TRAILING_DIGITS.find(rest) {
        Some(m) => (
            Some(m.as_str().to_string()),
            rest[..m.start()].trim().to_string(),
        ),
        None => (None, rest.to_string()),
    }
}

/// Decimal dollar amounts anywhere in the remainder
///
/// Non-negative amounts are charges, negative amounts payments; when a
/// line carries both, one of each is expected.
fn take_amounts(rest: &str) -> (Option<f64>, Option<f64>, String) {
    let mut charges = None;
    let mut payments = None;
    let mut remainder = rest.to_string();

    let matches: Vec<String> = DOLLAR_AMOUNT
        .find_iter(rest)
        .map(|m| m.as_str().to_string())
        .collect();

    for raw in matches {
        if let Ok(amount) = raw.replace(',', "").parse::<f64>() {
            if amount >= 0.0 {
                charges = Some(amount);
            } else {
                payments = Some(amount);
            }
        }
        remainder = remainder.replacen(&raw, "", 1);
    }

    (charges, payments, remainder.trim().to_string())
}

/// Space-bounded one- or two-digit tooth number
fn take_tooth(rest: &str) -> (Option<String>, String) {
    match TOOTH_NUMBER.captures(rest) {
        Some(caps) => {
            let tooth = caps[1].to_string();
            let m = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let mut remainder = String::with_capacity(rest.len());
            remainder.push_str(&rest[..m.start]);
            remainder.push(' ');
            remainder.push_str(&rest[m.end..]);
            (Some(tooth), remainder.trim().to_string())
        },
        None => (None, rest.to_string()),
    }
}

/// Leading alphanumeric procedure code, e.g. `D1110` or `CRWN`
fn take_procedure_code(rest: &str) -> (Option<String>, String) {
    match PROCEDURE_CODE.find(rest) {
        Some(m) => {
            let code = m.as_str().to_string();
            let mut remainder = String::with_capacity(rest.len());
            remainder.push_str(&rest[..m.start()]);
            remainder.push_str(&rest[m.end()..]);
            (Some(code), remainder.trim().to_string())
        },
        None => (None, rest.to_string()),
    }
}

/// Split what is left into patient name and free-text description
///
/// Segments are separated by runs of two or more spaces. The name runs
/// through the first comma-containing segment ("Last, First"); anything
/// after is description.
fn split_name_description(rest: &str) -> (String, String) {
    let mut name_parts: Vec<&str> = Vec::new();
    let mut desc_parts: Vec<&str> = Vec::new();
    let mut in_name = true;

    for segment in SEGMENT_GAP.split(rest.trim()) {
        if segment.is_empty() {
            continue;
        }
        if in_name {
            name_parts.push(segment);
            if segment.contains(',') {
                in_name = false;
            }
        } else {
            desc_parts.push(segment);
        }
    }

    if name_parts.is_empty() && desc_parts.is_empty() {
        return (rest.trim().to_string(), String::new());
    }

    (name_parts.join(" "), desc_parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_LINE: &str =
        "01/15/2024Doe, Jane  D1110 6 PROPHY-ADULT  120.00  1  DDS1 (619-555-0123)";

    #[test]
    fn test_full_line_extracts_all_fields() {
        let record = parse_ledger_line(FULL_LINE);
        assert!(record.error.is_none());

        let p = &record.payload;
        assert_eq!(p["date"], "01/15/2024");
        assert_eq!(p["phone"], "(619-555-0123)");
        assert_eq!(p["provider"], "DDS1");
        assert_eq!(p["bt"], "1");
        assert_eq!(p["charges"], 120.0);
        assert_eq!(p["payments"], Value::Null);
        assert_eq!(p["tooth"], "6");
        assert_eq!(p["code"], "D1110");
        assert_eq!(p["patientName"], "Doe, Jane");
        assert_eq!(p["description"], "PROPHY-ADULT");
        assert_eq!(p["raw"], FULL_LINE);
    }

    #[test]
    fn test_negative_amount_is_payment() {
        let record = parse_ledger_line(
            "01/16/2024Smith, Bob  CHECK PAYMENT  -250.00  2  DDS2 (555-123-4567)",
        );
        let p = &record.payload;
        assert_eq!(p["payments"], -250.0);
        assert_eq!(p["charges"], Value::Null);
    }

    #[test]
    fn test_charge_and_payment_on_one_line() {
        let record = parse_ledger_line(
            "01/16/2024Smith, Bob  ADJUSTMENT  100.00 -40.00  2  DDS2 (555-123-4567)",
        );
        let p = &record.payload;
        assert_eq!(p["charges"], 100.0);
        assert_eq!(p["payments"], -40.0);
    }

    #[test]
    fn test_missing_tokens_yield_nulls_not_failure() {
        let record = parse_ledger_line("01/17/2024Jones, Mary");
        assert!(record.error.is_none());
        let p = &record.payload;
        assert_eq!(p["date"], "01/17/2024");
        assert_eq!(p["phone"], Value::Null);
        assert_eq!(p["charges"], Value::Null);
    }

    #[test]
    fn test_undated_line_carries_error_marker() {
        let record = parse_ledger_line("TOTALS FOR THE DAY");
        assert!(record.error.is_some());
        assert_eq!(record.payload["raw"], "TOTALS FOR THE DAY");
    }

    #[test]
    fn test_wrapped_lines_are_joined() {
        let text = "01/15/2024Doe, Jane  D1110  PROPHY-\nADULT  120.00  1  DDS1 (619)555-0123\n";
        let records = parse(text);
        assert_eq!(records.len(), 1);
        let raw = records[0].payload["raw"].as_str().unwrap();
        assert!(raw.contains("PROPHY- ADULT"));
    }

    #[test]
    fn test_boilerplate_and_blank_lines_discarded() {
        let text = "DAY SHEET REPORT\nDate:Page:1\n\n01/15/2024Doe, Jane  D1110  120.00  1  DDS1 (619)555-0123\nAudit #44\n";
        let records = parse(text);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_no_input_line_dropped() {
        let text = "GARBAGE THAT IS NOT A LEDGER LINE\n01/15/2024Doe, Jane  120.00  1  DDS1 (619-555-0123)\nsome stray wrapped text\n01/16/2024Smith, Bob  -50.00  2  DDS2 (555-123-4567)\n";
        let records = parse(text);

        // The undated leader surfaces as its own record with an error
        // marker; the stray text joins the first dated entry.
        assert_eq!(records.len(), 3);
        assert!(records[0].error.is_some());
        assert!(records[1].payload["raw"]
            .as_str()
            .unwrap()
            .contains("stray wrapped text"));

        for record in &records {
            assert!(record.payload["raw"].is_string());
        }
    }

    #[test]
    fn test_extraction_steps_are_independent() {
        let (phone, rest) = take_trailing_phone("Doe, Jane  120.00 (619-555-0123)");
        assert_eq!(phone.as_deref(), Some("(619-555-0123)"));
        assert_eq!(rest, "Doe, Jane  120.00");

        let (provider, rest) = take_trailing_provider("Doe, Jane  DDS1");
        assert_eq!(provider.as_deref(), Some("DDS1"));
        assert_eq!(rest, "Doe, Jane");

        let (bt, rest) = take_trailing_business_type("Doe, Jane  12");
        assert_eq!(bt.as_deref(), Some("12"));
        assert_eq!(rest, "Doe, Jane");

        let (tooth, rest) = take_tooth("PROPHY 14 ADULT");
        assert_eq!(tooth.as_deref(), Some("14"));
        assert_eq!(rest, "PROPHY ADULT");

        let (code, rest) = take_procedure_code("D1110  cleaning");
        assert_eq!(code.as_deref(), Some("D1110"));
        assert_eq!(rest, "cleaning");
    }

    #[test]
    fn test_name_description_split() {
        let (name, desc) = split_name_description("Van Der Berg, Anna  routine exam  follow up");
        assert_eq!(name, "Van Der Berg, Anna");
        assert_eq!(desc, "routine exam follow up");

        let (name, desc) = split_name_description("no comma here at all");
        assert_eq!(name, "no comma here at all");
        assert_eq!(desc, "");
    }
}

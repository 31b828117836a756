//! Financial-summary parser for Eaglesoft PDF exports
//!
//! Deposit-slip style reports with a fixed set of labelled dollar
//! metrics plus a patient count. Output is exactly one record; metrics
//! absent from the report are null so a partial report still stages.

use super::ParsedRecord;
use regex::Regex;
use serde_json::{Map, Value};

/// Labelled dollar metrics, in report order, keyed by payload field
const DOLLAR_METRICS: &[(&str, &str)] = &[
    ("services", "Services"),
    ("deletedServices", "Deleted Services"),
    ("taxes", "Taxes"),
    ("deletedTaxes", "Deleted Taxes"),
    ("debitAdjustments", "Debit Adjustments"),
    ("financeCharges", "Finance Charges"),
    ("deletedDebits", "Deleted Debits"),
    ("cashPayments", "Cash Payments"),
    ("checkPayments", "Check Payments"),
    ("otherPayments", "Other Payments"),
    ("deletedCredits", "Deleted Credits"),
    ("billingCharges", "Billing Charges"),
    ("creditAdjustments", "Credit Adjustments"),
    ("writeOffs", "Write Offs"),
    ("discounts", "Discounts"),
    ("deletedDiscounts", "Deleted Discounts"),
    ("returnedChecks", "Returned Checks"),
    ("returnedCheckServiceCharges", "Returned Check Service Charges"),
];

/// Parse extracted financial-summary text into a single metrics record
pub fn parse(text: &str) -> Vec<ParsedRecord> {
    let mut payload = Map::new();

    for (field, label) in DOLLAR_METRICS {
        let value = match dollar_metric(text, label) {
            Some(v) => Value::from(v),
            None => Value::Null,
        };
        payload.insert((*field).to_string(), value);
    }

    let patients_seen = match count_metric(text, "Patients Seen") {
        Some(v) => Value::from(v),
        None => Value::Null,
    };
    payload.insert("patientsSeen".to_string(), patients_seen);

    vec![ParsedRecord::ok(Value::Object(payload))]
}

/// First `Label: $1,234.56` occurrence, with optional parentheses
/// around the amount as some reports print negatives that way.
fn dollar_metric(text: &str, label: &str) -> Option<f64> {
    let pattern = format!(r"{}:\s*\(?\$([\d,]+\.\d{{2}})\)?", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    caps[1].replace(',', "").parse().ok()
}

/// First `Label: 1,234` occurrence, a plain integer count
fn count_metric(text: &str, label: &str) -> Option<i64> {
    let pattern = format!(r"{}:\s*([\d,]+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    caps[1].replace(',', "").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_record_with_all_metric_keys() {
        let records = parse("");
        assert_eq!(records.len(), 1);

        let p = records[0].payload.as_object().unwrap();
        assert_eq!(p.len(), DOLLAR_METRICS.len() + 1);
        assert!(p.values().all(Value::is_null));
    }

    #[test]
    fn test_dollar_metric_extraction() {
        let text = "Deposit Summary\nServices: $1,234.56\nCash Payments: $89.10\n";
        let records = parse(text);
        let p = &records[0].payload;

        assert_eq!(p["services"], 1234.56);
        assert_eq!(p["cashPayments"], 89.1);
        assert_eq!(p["taxes"], Value::Null);
    }

    #[test]
    fn test_parenthesized_amount() {
        let records = parse("Write Offs: ($450.00)\n");
        assert_eq!(records[0].payload["writeOffs"], 450.0);
    }

    #[test]
    fn test_patients_seen_is_integer() {
        let records = parse("Patients Seen: 1,042\n");
        assert_eq!(records[0].payload["patientsSeen"], 1042);
    }

    #[test]
    fn test_amount_without_dollar_sign_ignored() {
        let records = parse("Services: 1234.56\n");
        assert_eq!(records[0].payload["services"], Value::Null);
    }
}

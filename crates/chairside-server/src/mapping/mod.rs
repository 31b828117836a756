//! Field-mapping engine
//!
//! Suggests a mapping from canonical target fields to the headers
//! observed in a staged upload. Exact normalized synonym matches win;
//! substring matches are the fallback. Suggestions are advisory, the
//! caller edits and saves the map it actually wants.

pub mod synonyms;

use crate::features::ingestion::types::SourceSystem;
use std::collections::BTreeMap;

const PATIENT_FIELDS: &[&str] = &[
    "externalId",
    "firstName",
    "lastName",
    "email",
    "phone",
    "dateOfBirth",
    "gender",
    "notes",
];

const PATIENT_REQUIRED: &[&str] = &["firstName", "lastName"];

/// Canonical fields for a promotion target, or None for an unsupported
/// target
pub fn target_fields(target: &str) -> Option<&'static [&'static str]> {
    match target {
        "patients" => Some(PATIENT_FIELDS),
        _ => None,
    }
}

/// Fields a mapping should populate for promotion to insert cleanly
pub fn required_fields(target: &str) -> &'static [&'static str] {
    match target {
        "patients" => PATIENT_REQUIRED,
        _ => &[],
    }
}

/// Collapse a header to lowercase alphanumeric words
///
/// `"First_Name "` and `"first name"` normalize identically, so synonym
/// matching is insensitive to the separator style of the export.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    out.trim().to_string()
}

/// Suggest a field map from observed headers
///
/// Every canonical field gets an entry; unmatched fields map to the
/// empty string. Returns None for an unsupported target.
pub fn suggest_field_map(
    headers: &[String],
    source: SourceSystem,
    dataset: &str,
    target: &str,
) -> Option<BTreeMap<String, String>> {
    let canonical = target_fields(target)?;
    let mut result = BTreeMap::new();

    let normalized: Vec<(&String, String)> =
        headers.iter().map(|h| (h, normalize(h))).collect();

    for field in canonical {
        let syns: Vec<String> = synonyms_for_field(source, dataset, target, field);

        // Exact normalized synonym match wins
        let mut mapped = syns
            .iter()
            .find_map(|syn| {
                normalized
                    .iter()
                    .find(|(_, norm)| norm == syn)
                    .map(|(raw, _)| (*raw).clone())
            })
            .unwrap_or_default();

        // Fall back to a substring match on the field name or any
        // synonym
        if mapped.is_empty() {
            let mut keys = vec![normalize(field)];
            keys.extend(syns);
            mapped = normalized
                .iter()
                .find(|(_, norm)| keys.iter().any(|k| norm.contains(k.as_str())))
                .map(|(raw, _)| (*raw).clone())
                .unwrap_or_default();
        }

        result.insert((*field).to_string(), mapped);
    }

    Some(result)
}

fn synonyms_for_field(
    source: SourceSystem,
    dataset: &str,
    target: &str,
    field: &str,
) -> Vec<String> {
    synonyms::synonyms_for(source, dataset, target, field)
        .iter()
        .map(|s| normalize(s))
        .collect()
}

/// Whether a field map covers every required field with a non-blank
/// header
pub fn is_field_map_complete(field_map: &BTreeMap<String, String>, target: &str) -> bool {
    required_fields(target)
        .iter()
        .all(|f| field_map.get(*f).is_some_and(|h| !h.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_collapses_separators() {
        assert_eq!(normalize("First_Name "), "first name");
        assert_eq!(normalize("E-MAIL"), "e mail");
        assert_eq!(normalize("  Chart   Number "), "chart number");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_exact_synonym_match_keeps_raw_header() {
        let map = suggest_field_map(
            &headers(&["Chart Number", "First Name", "Last Name", "DOB"]),
            SourceSystem::Dentrix,
            "patients",
            "patients",
        )
        .unwrap();

        assert_eq!(map["externalId"], "Chart Number");
        assert_eq!(map["firstName"], "First Name");
        assert_eq!(map["lastName"], "Last Name");
        assert_eq!(map["dateOfBirth"], "DOB");
        assert_eq!(map["email"], "");
    }

    #[test]
    fn test_exact_match_beats_substring() {
        // "Home Phone Ext" only matches by substring; "Phone" is exact
        let map = suggest_field_map(
            &headers(&["Home Phone Ext", "Phone"]),
            SourceSystem::Dentrix,
            "patients",
            "patients",
        )
        .unwrap();
        assert_eq!(map["phone"], "Phone");
    }

    #[test]
    fn test_substring_fallback_on_field_name() {
        let map = suggest_field_map(
            &headers(&["Patient FirstName (legal)"]),
            SourceSystem::Adp,
            "patients",
            "patients",
        )
        .unwrap();
        assert_eq!(map["firstName"], "Patient FirstName (legal)");
    }

    #[test]
    fn test_empty_headers_map_everything_blank() {
        let map =
            suggest_field_map(&[], SourceSystem::Eaglesoft, "patients", "patients").unwrap();
        assert_eq!(map.len(), PATIENT_FIELDS.len());
        assert!(map.values().all(String::is_empty));
    }

    #[test]
    fn test_suggestion_is_deterministic() {
        let hs = headers(&["Chart Number", "First Name", "Home Phone Ext", "DOB"]);
        let first = suggest_field_map(&hs, SourceSystem::Dentrix, "patients", "patients");
        let second = suggest_field_map(&hs, SourceSystem::Dentrix, "patients", "patients");
        assert_eq!(first, second);
    }

    #[test]
    fn test_unsupported_target_is_none() {
        assert!(suggest_field_map(&[], SourceSystem::Adp, "payroll", "payroll").is_none());
    }

    #[test]
    fn test_field_map_completeness() {
        let mut map = BTreeMap::new();
        map.insert("firstName".to_string(), "First Name".to_string());
        assert!(!is_field_map_complete(&map, "patients"));

        map.insert("lastName".to_string(), " ".to_string());
        assert!(!is_field_map_complete(&map, "patients"));

        map.insert("lastName".to_string(), "Last Name".to_string());
        assert!(is_field_map_complete(&map, "patients"));
    }
}

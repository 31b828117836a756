//! Per-source header synonym dictionaries
//!
//! Common export header names per canonical patient field, keyed by
//! source system. Lookup tries the dataset key first and falls back to
//! the promotion target, so a "patients" dataset and a "patients"
//! target share one dictionary.

use crate::features::ingestion::types::SourceSystem;

pub type FieldSynonyms = [(&'static str, &'static [&'static str])];

const DENTRIX_PATIENTS: &FieldSynonyms = &[
    (
        "externalId",
        &[
            "patient id",
            "patientid",
            "chart number",
            "chartnumber",
            "patnum",
            "guarantor id",
        ],
    ),
    (
        "firstName",
        &["first name", "firstname", "first", "given name", "fname"],
    ),
    (
        "lastName",
        &["last name", "lastname", "last", "surname", "lname"],
    ),
    ("email", &["email", "e-mail", "email address"]),
    (
        "phone",
        &[
            "phone",
            "phone number",
            "cell",
            "cell phone",
            "mobile",
            "mobile phone",
            "home phone",
            "work phone",
        ],
    ),
    (
        "dateOfBirth",
        &["dob", "date of birth", "birthdate", "birth date"],
    ),
    ("gender", &["gender", "sex"]),
    ("notes", &["notes", "comments", "patient notes"]),
];

const DENTALINTEL_PATIENTS: &FieldSynonyms = &[
    (
        "externalId",
        &["patient id", "patientid", "pt id", "di patient id"],
    ),
    ("firstName", &["first name", "firstname", "pt first name"]),
    ("lastName", &["last name", "lastname", "pt last name"]),
    ("email", &["email", "email address"]),
    (
        "phone",
        &["phone", "cell phone", "mobile", "mobile phone", "home phone"],
    ),
    ("dateOfBirth", &["dob", "date of birth", "birthdate"]),
    ("gender", &["gender", "sex"]),
    ("notes", &["notes", "comments"]),
];

const EAGLESOFT_PATIENTS: &FieldSynonyms = &[
    (
        "externalId",
        &[
            "patient id",
            "patientid",
            "chart number",
            "account #",
            "account number",
        ],
    ),
    ("firstName", &["first name", "firstname"]),
    ("lastName", &["last name", "lastname"]),
    ("email", &["email", "email address"]),
    (
        "phone",
        &["phone", "home phone", "work phone", "mobile phone", "cell"],
    ),
    ("dateOfBirth", &["dob", "date of birth", "birthdate"]),
    ("gender", &["gender", "sex"]),
    ("notes", &["notes", "comments"]),
];

// ADP exports are payroll-first; the patients dictionary covers
// staff-as-patient uploads.
const ADP_PATIENTS: &FieldSynonyms = &[
    (
        "externalId",
        &["associate id", "employee id", "person id"],
    ),
    ("firstName", &["first name", "firstname"]),
    ("lastName", &["last name", "lastname"]),
    ("email", &["email", "work email", "personal email"]),
    ("phone", &["phone", "mobile", "home phone"]),
    ("dateOfBirth", &["date of birth", "dob", "birthdate"]),
    ("gender", &["gender", "sex"]),
    ("notes", &["notes", "comments"]),
];

fn dictionary(source: SourceSystem, key: &str) -> Option<&'static FieldSynonyms> {
    if key != "patients" {
        return None;
    }
    Some(match source {
        SourceSystem::Dentrix => DENTRIX_PATIENTS,
        SourceSystem::Dentalintel => DENTALINTEL_PATIENTS,
        SourceSystem::Eaglesoft => EAGLESOFT_PATIENTS,
        SourceSystem::Adp => ADP_PATIENTS,
    })
}

/// Synonym list for one canonical field, with dataset-then-target
/// fallback
pub fn synonyms_for(
    source: SourceSystem,
    dataset: &str,
    target: &str,
    field: &str,
) -> &'static [&'static str] {
    dictionary(source, dataset)
        .or_else(|| dictionary(source, target))
        .and_then(|dict| {
            dict.iter()
                .find(|(f, _)| *f == field)
                .map(|(_, syns)| *syns)
        })
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_key_preferred_then_target() {
        // "unknown" dataset falls through to the "patients" target
        let syns = synonyms_for(SourceSystem::Dentrix, "unknown", "patients", "dateOfBirth");
        assert!(syns.contains(&"dob"));

        let syns = synonyms_for(SourceSystem::Dentrix, "patients", "patients", "firstName");
        assert!(syns.contains(&"fname"));
    }

    #[test]
    fn test_unmatched_field_is_empty() {
        assert!(synonyms_for(SourceSystem::Adp, "payroll", "patients", "nope").is_empty());
    }

    #[test]
    fn test_every_source_covers_all_patient_fields() {
        for source in [
            SourceSystem::Dentrix,
            SourceSystem::Dentalintel,
            SourceSystem::Eaglesoft,
            SourceSystem::Adp,
        ] {
            for field in crate::mapping::target_fields("patients").unwrap() {
                assert!(
                    !synonyms_for(source, "patients", "patients", field).is_empty(),
                    "{source} missing synonyms for {field}"
                );
            }
        }
    }
}

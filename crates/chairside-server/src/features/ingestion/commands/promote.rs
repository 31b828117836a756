//! Promote command
//!
//! Copies staged records into the canonical patients table using a
//! field map. Promotion is per-record best-effort: a record that fails
//! to insert counts as failed and the rest continue. Job status is
//! untouched; promotion can be re-run with a corrected map.

use crate::features::ingestion::types::{IngestionJob, StagedRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Date formats accepted for mapped date-of-birth values.
const DOB_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%m/%d/%y"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteJobCommand {
    pub job_id: Uuid,
    pub target: String,
    pub field_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoteJobResponse {
    pub inserted: i64,
    pub failed: i64,
    pub total: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum PromoteJobError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Unsupported promotion target: {0}")]
    UnsupportedTarget(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PromoteJobCommand {
    /// Only the target is gated; an incomplete field map is allowed and
    /// shows up as per-record insert failures in the summary.
    pub fn validate(&self) -> Result<(), PromoteJobError> {
        if self.target != "patients" {
            return Err(PromoteJobError::UnsupportedTarget(self.target.clone()));
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(job_id = %command.job_id, target = %command.target))]
pub async fn handle(
    pool: PgPool,
    promote_ceiling: i64,
    command: PromoteJobCommand,
) -> Result<PromoteJobResponse, PromoteJobError> {
    command.validate()?;

    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(command.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(PromoteJobError::JobNotFound(command.job_id))?;

    let records = sqlx::query_as::<_, StagedRecord>(
        "SELECT * FROM ingestion_records WHERE job_id = $1 ORDER BY ordinal_index ASC LIMIT $2",
    )
    .bind(job.id)
    .bind(promote_ceiling)
    .fetch_all(&pool)
    .await?;

    let mut inserted = 0i64;
    let mut failed = 0i64;

    for record in &records {
        let candidate = PatientCandidate::from_payload(&record.payload, &command.field_map);

        let result = sqlx::query(
            r#"
            INSERT INTO patients
                (id, practice_id, source_system, ingestion_job_id, external_id,
                 first_name, last_name, email, phone, date_of_birth, gender, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.practice_id)
        .bind(job.source_system)
        .bind(job.id)
        .bind(&candidate.external_id)
        .bind(&candidate.first_name)
        .bind(&candidate.last_name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(candidate.date_of_birth)
        .bind(&candidate.gender)
        .bind(&candidate.notes)
        .execute(&pool)
        .await;

        match result {
            Ok(_) => inserted += 1,
            Err(e) => {
                tracing::debug!(record_id = %record.id, error = %e, "Record promotion failed");
                failed += 1;
            },
        }
    }

    tracing::info!(inserted, failed, total = records.len(), "Promotion finished");

    Ok(PromoteJobResponse {
        inserted,
        failed,
        total: records.len() as i64,
    })
}

/// A patient row assembled from one staged payload
#[derive(Debug, Default, PartialEq)]
struct PatientCandidate {
    external_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    notes: Option<String>,
}

impl PatientCandidate {
    /// Pull mapped values out of a payload; blank headers and blank
    /// values yield None. A date of birth that fails to parse is
    /// dropped rather than failing the record.
    fn from_payload(payload: &Value, field_map: &BTreeMap<String, String>) -> Self {
        let get = |field: &str| -> Option<String> {
            let header = field_map.get(field)?;
            if header.trim().is_empty() {
                return None;
            }
            mapped_value(payload, header)
        };

        Self {
            external_id: get("externalId"),
            first_name: get("firstName"),
            last_name: get("lastName"),
            email: get("email"),
            phone: get("phone"),
            date_of_birth: get("dateOfBirth").and_then(|s| parse_dob(&s)),
            gender: get("gender"),
            notes: get("notes"),
        }
    }
}

fn mapped_value(payload: &Value, header: &str) -> Option<String> {
    match payload.get(header)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        },
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_dob(value: &str) -> Option<NaiveDate> {
    DOB_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_map() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("firstName".to_string(), "First Name".to_string());
        map.insert("lastName".to_string(), "Last Name".to_string());
        map.insert("dateOfBirth".to_string(), "DOB".to_string());
        map.insert("email".to_string(), String::new());
        map
    }

    #[test]
    fn test_candidate_from_mapped_payload() {
        let payload = json!({
            "First Name": "Jane",
            "Last Name": "Doe",
            "DOB": "03/14/1985",
            "Email": "jane@example.com",
        });
        let candidate = PatientCandidate::from_payload(&payload, &field_map());

        assert_eq!(candidate.first_name.as_deref(), Some("Jane"));
        assert_eq!(candidate.last_name.as_deref(), Some("Doe"));
        assert_eq!(
            candidate.date_of_birth,
            NaiveDate::from_ymd_opt(1985, 3, 14)
        );
        // Blank header means the field is unmapped
        assert_eq!(candidate.email, None);
    }

    #[test]
    fn test_unparseable_dob_dropped() {
        let payload = json!({ "First Name": "Jane", "Last Name": "Doe", "DOB": "unknown" });
        let candidate = PatientCandidate::from_payload(&payload, &field_map());
        assert_eq!(candidate.date_of_birth, None);
        assert!(candidate.first_name.is_some());
    }

    #[test]
    fn test_dob_formats() {
        for value in ["1985-03-14", "03/14/1985", "03-14-1985"] {
            assert_eq!(
                parse_dob(value),
                NaiveDate::from_ymd_opt(1985, 3, 14),
                "failed for {value}"
            );
        }
        assert_eq!(parse_dob("14.03.1985"), None);
    }

    #[test]
    fn test_numeric_values_stringified() {
        let payload = json!({ "Chart": 1042 });
        assert_eq!(mapped_value(&payload, "Chart").as_deref(), Some("1042"));
        assert_eq!(mapped_value(&payload, "Missing"), None);
    }

    #[test]
    fn test_validation_rejects_non_patient_target() {
        let cmd = PromoteJobCommand {
            job_id: Uuid::new_v4(),
            target: "appointments".to_string(),
            field_map: field_map(),
        };
        assert!(matches!(
            cmd.validate(),
            Err(PromoteJobError::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn test_validation_accepts_partial_map() {
        let mut map = BTreeMap::new();
        map.insert("firstName".to_string(), "First Name".to_string());
        let cmd = PromoteJobCommand {
            job_id: Uuid::new_v4(),
            target: "patients".to_string(),
            field_map: map,
        };
        // Missing required fields fail per record at insert time, not
        // the whole request
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_unmappable_record_still_yields_candidate() {
        let payload = json!({ "Unrelated": "x", "Also Unrelated": 3 });
        let candidate = PatientCandidate::from_payload(&payload, &field_map());
        // An all-None candidate is still attempted, so the record is
        // counted in the batch summary either way
        assert_eq!(candidate, PatientCandidate::default());
    }
}

//! Data models for manual ingestion
//!
//! Row types and enums for ingestion jobs, staged records, and saved
//! mapping templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Legacy practice-management or payroll platform an export came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceSystem {
    Dentrix,
    Dentalintel,
    Adp,
    Eaglesoft,
}

impl std::fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceSystem::Dentrix => write!(f, "dentrix"),
            SourceSystem::Dentalintel => write!(f, "dentalintel"),
            SourceSystem::Adp => write!(f, "adp"),
            SourceSystem::Eaglesoft => write!(f, "eaglesoft"),
        }
    }
}

impl std::str::FromStr for SourceSystem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dentrix" => Ok(SourceSystem::Dentrix),
            "dentalintel" => Ok(SourceSystem::Dentalintel),
            "adp" => Ok(SourceSystem::Adp),
            "eaglesoft" => Ok(SourceSystem::Eaglesoft),
            _ => Err(anyhow::anyhow!("Invalid source system: {}", s)),
        }
    }
}

/// File type detected from the uploaded filename extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Csv,
    Pdf,
    Json,
    Txt,
    Unknown,
}

impl FileType {
    /// Detect the file type from a filename extension
    ///
    /// Detection is purely extension-based; content sniffing is left to
    /// the parsers.
    pub fn from_filename(filename: &str) -> Self {
        let ext = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("csv") => FileType::Csv,
            Some("pdf") => FileType::Pdf,
            Some("json") => FileType::Json,
            Some("txt") => FileType::Txt,
            _ => FileType::Unknown,
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Csv => write!(f, "csv"),
            FileType::Pdf => write!(f, "pdf"),
            FileType::Json => write!(f, "json"),
            FileType::Txt => write!(f, "txt"),
            FileType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Lifecycle state of an ingestion job
///
/// Transitions are monotonic: `uploaded -> processing -> {completed | failed}`.
/// A job never moves backward out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether a transition to `next` respects the forward-only lifecycle
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Uploaded, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
                // Cancellation may fail a job that was never processed
                | (JobStatus::Uploaded, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Uploaded => write!(f, "uploaded"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// An uploaded legacy export and its processing state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IngestionJob {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub user_id: Option<Uuid>,
    pub source_system: SourceSystem,
    pub dataset: String,
    pub file_type: FileType,
    pub original_filename: String,
    pub storage_path: String,
    pub checksum: Option<String>,
    pub status: JobStatus,
    pub total_records: i32,
    pub processed_records: i32,
    pub failed_records: i32,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A parsed-but-not-yet-promoted record, owned by its job
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct StagedRecord {
    pub id: Uuid,
    pub job_id: Uuid,
    pub ordinal_index: i32,
    pub dataset: String,
    pub payload: serde_json::Value,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A saved mapping from canonical target fields to observed headers
///
/// Templates have an independent lifecycle; many may coexist for the
/// same (practice, source, dataset) tuple.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MappingTemplate {
    pub id: Uuid,
    pub practice_id: Uuid,
    pub source_system: SourceSystem,
    pub dataset: String,
    pub target: String,
    pub field_map: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_detection() {
        assert_eq!(FileType::from_filename("patients.csv"), FileType::Csv);
        assert_eq!(FileType::from_filename("Report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("export.json"), FileType::Json);
        assert_eq!(FileType::from_filename("notes.txt"), FileType::Txt);
        assert_eq!(FileType::from_filename("archive.xlsx"), FileType::Unknown);
        assert_eq!(FileType::from_filename("no-extension"), FileType::Unknown);
    }

    #[test]
    fn test_source_system_round_trip() {
        for s in ["dentrix", "dentalintel", "adp", "eaglesoft"] {
            let parsed: SourceSystem = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
        assert!("opendental".parse::<SourceSystem>().is_err());
    }

    #[test]
    fn test_status_transitions_forward_only() {
        use JobStatus::*;

        assert!(Uploaded.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(Uploaded.can_transition_to(Failed));

        // Never backward, never out of a terminal state
        assert!(!Processing.can_transition_to(Uploaded));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Completed.can_transition_to(Failed));
        assert!(!Failed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Uploaded));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Uploaded.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}

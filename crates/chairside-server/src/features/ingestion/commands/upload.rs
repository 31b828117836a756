//! Upload command
//!
//! Accepts a legacy export, persists it to the upload store, and
//! creates the ingestion job in `uploaded` state. Nothing is persisted
//! unless every validation passes. CSV uploads get a small row preview
//! so the caller can sanity-check before processing.

use crate::features::ingestion::types::{FileType, IngestionJob, SourceSystem};
use crate::storage::{StorageError, UploadStore};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

/// Rows included in the upload preview.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadExportCommand {
    pub practice_id: Uuid,
    pub user_id: Option<Uuid>,
    pub source_system: SourceSystem,
    pub dataset: String,
    pub original_filename: String,
    #[serde(skip)]
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadExportResponse {
    pub job: IngestionJob,
    pub preview: Vec<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadExportError {
    #[error("Practice id is required")]
    PracticeRequired,
    #[error("Dataset is required and cannot be empty")]
    DatasetRequired,
    #[error("Filename is required and cannot be empty")]
    FilenameRequired,
    #[error("Filename must not exceed 255 characters")]
    FilenameLength,
    #[error("File content is required and cannot be empty")]
    ContentRequired,
    #[error("File of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: usize, max: usize },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UploadExportCommand {
    pub fn validate(&self, max_upload_bytes: usize) -> Result<(), UploadExportError> {
        if self.practice_id.is_nil() {
            return Err(UploadExportError::PracticeRequired);
        }
        if self.dataset.trim().is_empty() {
            return Err(UploadExportError::DatasetRequired);
        }
        if self.original_filename.trim().is_empty() {
            return Err(UploadExportError::FilenameRequired);
        }
        if self.original_filename.len() > 255 {
            return Err(UploadExportError::FilenameLength);
        }
        if self.content.is_empty() {
            return Err(UploadExportError::ContentRequired);
        }
        if self.content.len() > max_upload_bytes {
            return Err(UploadExportError::TooLarge {
                size: self.content.len(),
                max: max_upload_bytes,
            });
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, store, command), fields(practice_id = %command.practice_id, filename = %command.original_filename))]
pub async fn handle(
    pool: PgPool,
    store: UploadStore,
    max_upload_bytes: usize,
    command: UploadExportCommand,
) -> Result<UploadExportResponse, UploadExportError> {
    command.validate(max_upload_bytes)?;

    let file_type = FileType::from_filename(&command.original_filename);
    let preview = build_preview(file_type, &command.content);

    let stored = store
        .save(command.practice_id, &command.original_filename, &command.content)
        .await?;

    let job = sqlx::query_as::<_, IngestionJob>(
        r#"
        INSERT INTO ingestion_jobs
            (id, practice_id, user_id, source_system, dataset, file_type,
             original_filename, storage_path, checksum, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'uploaded')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(command.practice_id)
    .bind(command.user_id)
    .bind(command.source_system)
    .bind(&command.dataset)
    .bind(file_type)
    .bind(&command.original_filename)
    .bind(stored.path.to_string_lossy().to_string())
    .bind(&stored.checksum)
    .fetch_one(&pool)
    .await?;

    tracing::info!(job_id = %job.id, size = stored.size, "Export uploaded");

    Ok(UploadExportResponse { job, preview })
}

/// First rows of a CSV upload; other formats get a placeholder since
/// parsing them costs a full pass.
fn build_preview(file_type: FileType, content: &[u8]) -> Vec<Value> {
    match file_type {
        FileType::Csv => crate::parsers::csv::parse(content)
            .into_iter()
            .take(PREVIEW_ROWS)
            .map(|r| r.payload)
            .collect(),
        FileType::Pdf => vec![json!({ "note": "PDF contents are parsed during processing" })],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> UploadExportCommand {
        UploadExportCommand {
            practice_id: Uuid::new_v4(),
            user_id: None,
            source_system: SourceSystem::Dentrix,
            dataset: "patients".to_string(),
            original_filename: "patients.csv".to_string(),
            content: b"firstName,lastName\nJane,Doe\n".to_vec(),
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command().validate(1024).is_ok());
    }

    #[test]
    fn test_validation_nil_practice() {
        let mut cmd = command();
        cmd.practice_id = Uuid::nil();
        assert!(matches!(
            cmd.validate(1024),
            Err(UploadExportError::PracticeRequired)
        ));
    }

    #[test]
    fn test_validation_empty_dataset() {
        let mut cmd = command();
        cmd.dataset = "  ".to_string();
        assert!(matches!(
            cmd.validate(1024),
            Err(UploadExportError::DatasetRequired)
        ));
    }

    #[test]
    fn test_validation_empty_content() {
        let mut cmd = command();
        cmd.content = Vec::new();
        assert!(matches!(
            cmd.validate(1024),
            Err(UploadExportError::ContentRequired)
        ));
    }

    #[test]
    fn test_validation_size_cap() {
        let cmd = command();
        assert!(matches!(
            cmd.validate(4),
            Err(UploadExportError::TooLarge { size: _, max: 4 })
        ));
    }

    #[test]
    fn test_csv_preview_rows() {
        let preview = build_preview(FileType::Csv, b"a,b\n1,2\n3,4\n5,6\n7,8\n9,10\n11,12\n");
        assert_eq!(preview.len(), PREVIEW_ROWS);
        assert_eq!(preview[0]["a"], "1");
    }

    #[test]
    fn test_pdf_preview_is_placeholder() {
        let preview = build_preview(FileType::Pdf, b"%PDF-1.4");
        assert_eq!(preview.len(), 1);
        assert!(preview[0]["note"].is_string());
    }
}

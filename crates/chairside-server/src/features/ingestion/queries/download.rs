//! Download query
//!
//! Reads the stored upload back for re-download under its original
//! filename.

use crate::features::ingestion::types::IngestionJob;
use crate::storage::{StorageError, UploadStore};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadExportQuery {
    pub job_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct DownloadExportResponse {
    pub original_filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadExportError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, store), fields(job_id = %query.job_id))]
pub async fn handle(
    pool: PgPool,
    store: UploadStore,
    query: DownloadExportQuery,
) -> Result<DownloadExportResponse, DownloadExportError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(query.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(DownloadExportError::JobNotFound(query.job_id))?;

    let content = store.read(&job.storage_path).await?;

    Ok(DownloadExportResponse {
        original_filename: job.original_filename,
        content,
    })
}

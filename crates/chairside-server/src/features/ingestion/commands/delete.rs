//! Delete command
//!
//! Removes a job, its staged records, and the stored file. File
//! removal is best-effort; a missing file never blocks cleanup of the
//! database rows.

use crate::features::ingestion::types::IngestionJob;
use crate::storage::UploadStore;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteJobResponse {
    pub job_id: Uuid,
    pub deleted_records: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteJobError {
    #[error("Ingestion job {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, store), fields(job_id = %command.job_id))]
pub async fn handle(
    pool: PgPool,
    store: UploadStore,
    command: DeleteJobCommand,
) -> Result<DeleteJobResponse, DeleteJobError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(command.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(DeleteJobError::NotFound(command.job_id))?;

    if let Err(e) = store.remove(&job.storage_path).await {
        tracing::warn!(path = %job.storage_path, error = %e, "Stored upload could not be removed");
    }

    let deleted_records = sqlx::query("DELETE FROM ingestion_records WHERE job_id = $1")
        .bind(job.id)
        .execute(&pool)
        .await?
        .rows_affected();

    sqlx::query("DELETE FROM ingestion_jobs WHERE id = $1")
        .bind(job.id)
        .execute(&pool)
        .await?;

    tracing::info!(deleted_records, "Ingestion job deleted");

    Ok(DeleteJobResponse {
        job_id: job.id,
        deleted_records,
    })
}

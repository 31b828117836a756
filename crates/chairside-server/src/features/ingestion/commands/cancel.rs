//! Cancel command
//!
//! Manually fails a job that has not reached a terminal state. This is
//! the recovery path for jobs stuck in `processing` after a crash as
//! well as the way to abandon an upload before processing.

use crate::features::ingestion::types::{IngestionJob, JobStatus};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

pub const CANCELLED_ERROR: &str = "Cancelled by user";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelJobResponse {
    pub job: IngestionJob,
}

#[derive(Debug, thiserror::Error)]
pub enum CancelJobError {
    #[error("Ingestion job {0} not found")]
    NotFound(Uuid),
    #[error("Job is already in terminal status '{0}'")]
    AlreadyTerminal(JobStatus),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool), fields(job_id = %command.job_id))]
pub async fn handle(
    pool: PgPool,
    command: CancelJobCommand,
) -> Result<CancelJobResponse, CancelJobError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(command.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(CancelJobError::NotFound(command.job_id))?;

    if job.status.is_terminal() {
        return Err(CancelJobError::AlreadyTerminal(job.status));
    }

    let job = sqlx::query_as::<_, IngestionJob>(
        r#"
        UPDATE ingestion_jobs
        SET status = 'failed', error = $2, updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(CANCELLED_ERROR)
    .fetch_one(&pool)
    .await?;

    tracing::info!("Ingestion job cancelled");

    Ok(CancelJobResponse { job })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_names_status() {
        let err = CancelJobError::AlreadyTerminal(JobStatus::Completed);
        assert!(err.to_string().contains("completed"));
    }
}

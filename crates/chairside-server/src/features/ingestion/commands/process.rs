//! Process command
//!
//! Runs the parser over an uploaded export and stages the results.
//! Only `uploaded` jobs are eligible; processing moves the job to
//! `processing` with a start timestamp, then to `completed` with
//! record counts, or `failed` with the error text persisted on the row.

use crate::features::ingestion::types::{IngestionJob, JobStatus};
use crate::parsers::{ParsedRecord, ParserError, ParserStrategy};
use crate::storage::{StorageError, UploadStore};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessJobCommand {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessJobResponse {
    pub job: IngestionJob,
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessJobError {
    #[error("Ingestion job {0} not found")]
    NotFound(Uuid),
    #[error("Job cannot be processed from status '{0}'")]
    InvalidStatus(JobStatus),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[tracing::instrument(skip(pool, store), fields(job_id = %command.job_id))]
pub async fn handle(
    pool: PgPool,
    store: UploadStore,
    insert_chunk_size: usize,
    command: ProcessJobCommand,
) -> Result<ProcessJobResponse, ProcessJobError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(command.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(ProcessJobError::NotFound(command.job_id))?;

    if job.status != JobStatus::Uploaded {
        return Err(ProcessJobError::InvalidStatus(job.status));
    }

    sqlx::query(
        "UPDATE ingestion_jobs SET status = 'processing', started_at = now(), updated_at = now() \
         WHERE id = $1",
    )
    .bind(job.id)
    .execute(&pool)
    .await?;

    // Any failure past this point leaves the job failed with its error
    // text, never stuck in processing.
    let records = match stage(&pool, &store, insert_chunk_size, &job).await {
        Ok(records) => records,
        Err(e) => {
            mark_failed(&pool, job.id, &e.to_string()).await?;
            return Err(e);
        },
    };

    let total = records.len() as i32;
    let failed = records.iter().filter(|r| r.error.is_some()).count() as i32;

    let job = sqlx::query_as::<_, IngestionJob>(
        r#"
        UPDATE ingestion_jobs
        SET status = 'completed', total_records = $2, processed_records = $3,
            failed_records = $4, completed_at = now(), updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(total)
    .bind(total - failed)
    .bind(failed)
    .fetch_one(&pool)
    .await?;

    tracing::info!(
        total = total,
        failed = failed,
        "Ingestion job processed"
    );

    Ok(ProcessJobResponse { job })
}

/// Parse the stored file and insert staged records in chunks
async fn stage(
    pool: &PgPool,
    store: &UploadStore,
    insert_chunk_size: usize,
    job: &IngestionJob,
) -> Result<Vec<ParsedRecord>, ProcessJobError> {
    let content = store.read(&job.storage_path).await?;
    let strategy = ParserStrategy::select(job.file_type, job.source_system)?;
    let records = strategy.parse(&content)?;

    for (chunk_start, chunk) in records
        .chunks(insert_chunk_size)
        .enumerate()
        .map(|(i, c)| (i * insert_chunk_size, c))
    {
        let mut builder = QueryBuilder::new(
            "INSERT INTO ingestion_records (id, job_id, ordinal_index, dataset, payload, error) ",
        );
        builder.push_values(chunk.iter().enumerate(), |mut b, (offset, record)| {
            b.push_bind(Uuid::new_v4())
                .push_bind(job.id)
                .push_bind((chunk_start + offset) as i32)
                .push_bind(&job.dataset)
                .push_bind(&record.payload)
                .push_bind(&record.error);
        });
        builder.build().execute(pool).await?;
    }

    Ok(records)
}

/// Failure UPDATE; `completed_at` stays unset for jobs that never
/// completed.
const MARK_FAILED_SQL: &str =
    "UPDATE ingestion_jobs SET status = 'failed', error = $2, updated_at = now() WHERE id = $1";

async fn mark_failed(pool: &PgPool, job_id: Uuid, error: &str) -> Result<(), sqlx::Error> {
    sqlx::query(MARK_FAILED_SQL)
        .bind(job_id)
        .bind(error)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ingestion::types::{FileType, SourceSystem};

    #[test]
    fn test_invalid_status_error_names_status() {
        let err = ProcessJobError::InvalidStatus(JobStatus::Completed);
        assert!(err.to_string().contains("completed"));
    }

    #[test]
    fn test_unknown_file_type_surfaces_parser_error() {
        let result = ParserStrategy::select(FileType::Unknown, SourceSystem::Dentrix);
        let err: ProcessJobError = result.unwrap_err().into();
        assert!(matches!(err, ProcessJobError::Parser(_)));
    }

    #[test]
    fn test_failure_update_leaves_completion_time_unset() {
        assert!(!MARK_FAILED_SQL.contains("completed_at"));
    }
}

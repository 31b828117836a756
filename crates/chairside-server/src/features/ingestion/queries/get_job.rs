//! Get-job query

use crate::features::ingestion::types::IngestionJob;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobQuery {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetJobResponse {
    pub job: IngestionJob,
}

#[derive(Debug, thiserror::Error)]
pub enum GetJobError {
    #[error("Ingestion job {0} not found")]
    NotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(pool: PgPool, query: GetJobQuery) -> Result<GetJobResponse, GetJobError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(query.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(GetJobError::NotFound(query.job_id))?;

    Ok(GetJobResponse { job })
}

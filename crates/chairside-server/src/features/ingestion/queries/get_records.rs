//! Get-records query
//!
//! Pages through a job's staged records in parse order.

use crate::features::ingestion::types::StagedRecord;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecordsQuery {
    pub job_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecordsResponse {
    pub records: Vec<StagedRecord>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetRecordsError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(
    pool: PgPool,
    query: GetRecordsQuery,
) -> Result<GetRecordsResponse, GetRecordsError> {
    let exists: Option<Uuid> =
        sqlx::query_scalar("SELECT id FROM ingestion_jobs WHERE id = $1")
            .bind(query.job_id)
            .fetch_optional(&pool)
            .await?;
    if exists.is_none() {
        return Err(GetRecordsError::JobNotFound(query.job_id));
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = query.offset.unwrap_or(0).max(0);

    let records = sqlx::query_as::<_, StagedRecord>(
        "SELECT * FROM ingestion_records WHERE job_id = $1 \
         ORDER BY ordinal_index ASC LIMIT $2 OFFSET $3",
    )
    .bind(query.job_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&pool)
    .await?;

    let total: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ingestion_records WHERE job_id = $1")
            .bind(query.job_id)
            .fetch_one(&pool)
            .await?;

    Ok(GetRecordsResponse {
        records,
        total,
        limit,
        offset,
    })
}

//! Suggest-mapping query
//!
//! Combines the job's observed headers with the synonym dictionaries to
//! propose a field map for a promotion target.

use crate::features::ingestion::types::IngestionJob;
use crate::mapping;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestMappingQuery {
    pub job_id: Uuid,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestMappingResponse {
    pub headers: Vec<String>,
    pub field_map: BTreeMap<String, String>,
    pub complete: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum SuggestMappingError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Unsupported promotion target: {0}")]
    UnsupportedTarget(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(
    pool: PgPool,
    query: SuggestMappingQuery,
) -> Result<SuggestMappingResponse, SuggestMappingError> {
    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(query.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(SuggestMappingError::JobNotFound(query.job_id))?;

    let payloads = super::get_headers::sample_payloads(&pool, job.id).await?;
    let headers = super::get_headers::header_union(&payloads);

    let field_map =
        mapping::suggest_field_map(&headers, job.source_system, &job.dataset, &query.target)
            .ok_or_else(|| SuggestMappingError::UnsupportedTarget(query.target.clone()))?;

    let complete = mapping::is_field_map_complete(&field_map, &query.target);

    Ok(SuggestMappingResponse {
        headers,
        field_map,
        complete,
    })
}

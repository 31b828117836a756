//! List-jobs query
//!
//! Newest-first job listing with optional practice and status filters.

use crate::features::ingestion::types::{IngestionJob, JobStatus};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsQuery {
    /// Restrict to these practices; empty means all
    #[serde(default)]
    pub practice_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<IngestionJob>,
    pub total: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ListJobsError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(pool: PgPool, query: ListJobsQuery) -> Result<ListJobsResponse, ListJobsError> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let mut builder = QueryBuilder::new("SELECT * FROM ingestion_jobs WHERE 1=1");
    push_filters(&mut builder, &query);
    builder.push(" ORDER BY created_at DESC LIMIT ");
    builder.push_bind(limit);

    let jobs = builder
        .build_query_as::<IngestionJob>()
        .fetch_all(&pool)
        .await?;

    let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM ingestion_jobs WHERE 1=1");
    push_filters(&mut count_builder, &query);
    let total: i64 = count_builder
        .build_query_scalar()
        .fetch_one(&pool)
        .await?;

    Ok(ListJobsResponse { jobs, total })
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, sqlx::Postgres>, query: &'a ListJobsQuery) {
    if !query.practice_ids.is_empty() {
        builder.push(" AND practice_id = ANY(");
        builder.push_bind(&query.practice_ids);
        builder.push(")");
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_clamped() {
        assert_eq!(Some(5000i64).unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT), 200);
        assert_eq!(None.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT), 50);
        assert_eq!(Some(0i64).unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT), 1);
    }
}

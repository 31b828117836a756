//! Get-headers query
//!
//! The observed headers of a job are the union of object keys across
//! its first staged records, in first-seen order. Sampling a handful of
//! records is enough for exports with a uniform shape and keeps the
//! query cheap for large jobs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

/// Staged records sampled for the header union.
pub const HEADER_SAMPLE_SIZE: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHeadersQuery {
    pub job_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHeadersResponse {
    pub headers: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GetHeadersError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(
    pool: PgPool,
    query: GetHeadersQuery,
) -> Result<GetHeadersResponse, GetHeadersError> {
    let exists: Option<Uuid> = sqlx::query_scalar("SELECT id FROM ingestion_jobs WHERE id = $1")
        .bind(query.job_id)
        .fetch_optional(&pool)
        .await?;
    if exists.is_none() {
        return Err(GetHeadersError::JobNotFound(query.job_id));
    }

    let payloads = sample_payloads(&pool, query.job_id).await?;

    Ok(GetHeadersResponse {
        headers: header_union(&payloads),
    })
}

/// First few staged payloads of a job, in parse order
pub(crate) async fn sample_payloads(
    pool: &PgPool,
    job_id: Uuid,
) -> Result<Vec<Value>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT payload FROM ingestion_records WHERE job_id = $1 \
         ORDER BY ordinal_index ASC LIMIT $2",
    )
    .bind(job_id)
    .bind(HEADER_SAMPLE_SIZE)
    .fetch_all(pool)
    .await
}

/// Union of object keys across payloads, keeping first-seen order
pub(crate) fn header_union(payloads: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for payload in payloads {
        if let Value::Object(map) = payload {
            for key in map.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_union_preserves_first_seen_order() {
        let payloads = vec![
            json!({ "First Name": "Jane", "Last Name": "Doe" }),
            json!({ "Last Name": "Smith", "DOB": "01/01/1990" }),
        ];
        assert_eq!(
            header_union(&payloads),
            vec!["First Name", "Last Name", "DOB"]
        );
    }

    #[test]
    fn test_header_union_skips_non_objects() {
        let payloads = vec![json!("scalar"), json!([1, 2]), json!({ "a": 1 })];
        assert_eq!(header_union(&payloads), vec!["a"]);
    }

    #[test]
    fn test_header_union_empty() {
        assert!(header_union(&[]).is_empty());
    }
}

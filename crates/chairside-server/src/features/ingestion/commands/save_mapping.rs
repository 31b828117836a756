//! Save-mapping command
//!
//! Persists an edited field map as a reusable template keyed by the
//! job's practice, source system, and dataset. Templates are
//! append-only; saving again creates a new one.

use crate::features::ingestion::types::{IngestionJob, MappingTemplate};
use crate::mapping;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMappingCommand {
    pub job_id: Uuid,
    pub target: String,
    pub field_map: BTreeMap<String, String>,
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveMappingResponse {
    pub template: MappingTemplate,
}

#[derive(Debug, thiserror::Error)]
pub enum SaveMappingError {
    #[error("Ingestion job {0} not found")]
    JobNotFound(Uuid),
    #[error("Unsupported promotion target: {0}")]
    UnsupportedTarget(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SaveMappingCommand {
    /// Partial maps are saveable; completeness only matters at
    /// promotion time, where it surfaces as per-record failures.
    pub fn validate(&self) -> Result<(), SaveMappingError> {
        if mapping::target_fields(&self.target).is_none() {
            return Err(SaveMappingError::UnsupportedTarget(self.target.clone()));
        }
        Ok(())
    }
}

#[tracing::instrument(skip(pool, command), fields(job_id = %command.job_id, target = %command.target))]
pub async fn handle(
    pool: PgPool,
    command: SaveMappingCommand,
) -> Result<SaveMappingResponse, SaveMappingError> {
    command.validate()?;

    let job = sqlx::query_as::<_, IngestionJob>("SELECT * FROM ingestion_jobs WHERE id = $1")
        .bind(command.job_id)
        .fetch_optional(&pool)
        .await?
        .ok_or(SaveMappingError::JobNotFound(command.job_id))?;

    let field_map = Value::Object(
        command
            .field_map
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    );

    let template = sqlx::query_as::<_, MappingTemplate>(
        r#"
        INSERT INTO ingestion_mappings
            (id, practice_id, source_system, dataset, target, field_map, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job.practice_id)
    .bind(job.source_system)
    .bind(&job.dataset)
    .bind(&command.target)
    .bind(field_map)
    .bind(command.created_by)
    .fetch_one(&pool)
    .await?;

    tracing::info!(template_id = %template.id, "Mapping template saved");

    Ok(SaveMappingResponse { template })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_map() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("firstName".to_string(), "First Name".to_string());
        map.insert("lastName".to_string(), "Last Name".to_string());
        map
    }

    #[test]
    fn test_validation_success() {
        let cmd = SaveMappingCommand {
            job_id: Uuid::new_v4(),
            target: "patients".to_string(),
            field_map: field_map(),
            created_by: None,
        };
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_validation_unsupported_target() {
        let cmd = SaveMappingCommand {
            job_id: Uuid::new_v4(),
            target: "payroll".to_string(),
            field_map: field_map(),
            created_by: None,
        };
        assert!(matches!(
            cmd.validate(),
            Err(SaveMappingError::UnsupportedTarget(_))
        ));
    }

    #[test]
    fn test_validation_accepts_partial_map() {
        let mut map = field_map();
        map.remove("lastName");
        let cmd = SaveMappingCommand {
            job_id: Uuid::new_v4(),
            target: "patients".to_string(),
            field_map: map,
            created_by: None,
        };
        // Templates are work in progress; a partial map saves fine
        assert!(cmd.validate().is_ok());
    }
}

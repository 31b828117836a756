//! Feature modules implementing the chairside API
//!
//! Each feature is a vertical slice with its own commands, queries, and
//! routes:
//! - `commands/` - Write operations (upload, process, promote, ...)
//! - `queries/` - Read operations (get, list, suggest, ...)
//! - `routes.rs` - HTTP route definitions
//! - `types.rs` - Shared types

pub mod ingestion;

use crate::config::IngestionConfig;
use crate::storage::UploadStore;
use axum::Router;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool for database operations
    pub db: sqlx::PgPool,
    /// Filesystem store holding uploaded exports
    pub store: UploadStore,
    /// Ingestion limits and tuning
    pub config: IngestionConfig,
}

/// Creates the main API router with all feature routes mounted
pub fn router(state: FeatureState) -> Router<()> {
    let max_upload_bytes = state.config.max_upload_bytes;
    Router::new().nest(
        "/ingestion",
        ingestion::ingestion_routes(max_upload_bytes).with_state(state),
    )
}

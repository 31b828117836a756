//! Manual ingestion feature
//!
//! Upload, processing, staging, mapping, and promotion of legacy
//! practice-management exports.

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use routes::ingestion_routes;

//! Chairside Server Library
//!
//! HTTP server for the manual data-ingestion pipeline: dental practices
//! upload exports from their legacy practice-management systems, the
//! server parses and stages the records, and reviewed records are
//! promoted into the canonical patient tables.
//!
//! # Architecture
//!
//! Features are vertical slices under [`features`], each split into
//! commands (writes) and queries (reads) with colocated validation and
//! tests. Format parsing lives in [`parsers`], header-to-field
//! suggestion in [`mapping`], and file persistence in [`storage`].
//!
//! ## Framework Stack
//!
//! - **Axum**: HTTP routing and multipart uploads
//! - **SQLx**: PostgreSQL access and migrations
//! - **Tower**: Middleware and service abstractions

pub mod api;
pub mod config;
pub mod features;
pub mod mapping;
pub mod middleware;
pub mod parsers;
pub mod storage;

pub use api::response::{ApiResult, AppError};

//! Chairside Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the Chairside project.
//!
//! # Overview
//!
//! This crate provides common functionality used across all Chairside
//! workspace members:
//!
//! - **Error Handling**: Custom error types and result types
//! - **Logging**: Centralized tracing setup for all binaries
//! - **Checksums**: File integrity verification utilities

pub mod checksum;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use error::{ChairsideError, Result};

//! Read operations for ingestion jobs

pub mod download;
pub mod get_headers;
pub mod get_job;
pub mod get_records;
pub mod list_jobs;
pub mod suggest_mapping;

pub use download::{DownloadExportError, DownloadExportQuery};
pub use get_headers::{GetHeadersError, GetHeadersQuery};
pub use get_job::{GetJobError, GetJobQuery};
pub use get_records::{GetRecordsError, GetRecordsQuery};
pub use list_jobs::{ListJobsError, ListJobsQuery};
pub use suggest_mapping::{SuggestMappingError, SuggestMappingQuery};

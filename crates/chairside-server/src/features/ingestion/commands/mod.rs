//! Write operations for ingestion jobs

pub mod cancel;
pub mod delete;
pub mod process;
pub mod promote;
pub mod save_mapping;
pub mod upload;

pub use cancel::{CancelJobCommand, CancelJobError};
pub use delete::{DeleteJobCommand, DeleteJobError};
pub use process::{ProcessJobCommand, ProcessJobError};
pub use promote::{PromoteJobCommand, PromoteJobError};
pub use save_mapping::{SaveMappingCommand, SaveMappingError};
pub use upload::{UploadExportCommand, UploadExportError};

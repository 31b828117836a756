//! HTTP routes for manual ingestion

use crate::api::response::{ApiResponse, AppError};
use crate::features::ingestion::types::{FileType, JobStatus, SourceSystem};
use crate::features::FeatureState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::commands::{
    self, CancelJobCommand, CancelJobError, DeleteJobCommand, DeleteJobError, ProcessJobCommand,
    ProcessJobError, PromoteJobCommand, PromoteJobError, SaveMappingCommand, SaveMappingError,
    UploadExportCommand, UploadExportError,
};
use super::queries::{
    self, DownloadExportError, DownloadExportQuery, GetHeadersError, GetHeadersQuery, GetJobError,
    GetJobQuery, GetRecordsError, GetRecordsQuery, ListJobsError, ListJobsQuery,
    SuggestMappingError, SuggestMappingQuery,
};

/// Multipart parsing headroom on top of the configured upload cap.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn ingestion_routes(max_upload_bytes: usize) -> Router<FeatureState> {
    Router::new()
        .route("/supported", get(supported))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes + BODY_LIMIT_SLACK)),
        )
        .route("/jobs", get(list_jobs))
        .route("/jobs/:id", get(get_job).delete(delete_job))
        .route("/jobs/:id/process", post(process_job))
        .route("/jobs/:id/records", get(get_records))
        .route("/jobs/:id/headers", get(get_headers))
        .route("/jobs/:id/suggest-map", get(suggest_mapping))
        .route("/jobs/:id/map", post(save_mapping))
        .route("/jobs/:id/promote", post(promote_job))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/jobs/:id/download", get(download))
}

/// Enumerates the source systems, file types, and promotion targets the
/// pipeline accepts
async fn supported(State(state): State<FeatureState>) -> impl IntoResponse {
    ApiResponse::success(json!({
        "source_systems": ["dentrix", "dentalintel", "adp", "eaglesoft"],
        "file_types": ["csv", "pdf", "json", "txt"],
        "targets": ["patients"],
        "max_upload_bytes": state.config.max_upload_bytes,
    }))
}

#[tracing::instrument(skip(state, multipart))]
async fn upload(
    State(state): State<FeatureState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut practice_id: Option<Uuid> = None;
    let mut user_id: Option<Uuid> = None;
    let mut source_system: Option<SourceSystem> = None;
    let mut dataset: Option<String> = None;
    let mut original_filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                original_filename = field.file_name().map(|s| s.to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file bytes: {}", e))
                })?;
                content = Some(data.to_vec());
            },
            "practice_id" => practice_id = Some(parse_text_field(field, &name).await?),
            "user_id" => user_id = Some(parse_text_field(field, &name).await?),
            "source_system" => source_system = Some(parse_text_field(field, &name).await?),
            "dataset" => {
                dataset = Some(field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?)
            },
            _ => {},
        }
    }

    let command = UploadExportCommand {
        practice_id: practice_id
            .ok_or_else(|| AppError::BadRequest("Missing field 'practice_id'".to_string()))?,
        user_id,
        source_system: source_system
            .ok_or_else(|| AppError::BadRequest("Missing field 'source_system'".to_string()))?,
        // Exports without a declared dataset still stage; the label is
        // resolved when a mapping target is chosen
        dataset: dataset.unwrap_or_else(|| "unknown".to_string()),
        original_filename: original_filename
            .ok_or_else(|| AppError::BadRequest("Missing file upload".to_string()))?,
        content: content
            .ok_or_else(|| AppError::BadRequest("Missing file upload".to_string()))?,
    };

    let response = commands::upload::handle(
        state.db,
        state.store,
        state.config.max_upload_bytes,
        command,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))).into_response())
}

/// Reads a text multipart field and parses it with FromStr
async fn parse_text_field<T>(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let text = field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;
    text.trim()
        .parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid field '{}': {}", name, e)))
}

#[derive(Debug, Deserialize)]
struct ListJobsParams {
    /// Comma-separated practice ids
    practice_ids: Option<String>,
    status: Option<JobStatus>,
    limit: Option<i64>,
}

async fn list_jobs(
    State(state): State<FeatureState>,
    Query(params): Query<ListJobsParams>,
) -> Result<Response, AppError> {
    let practice_ids = params
        .practice_ids
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<Uuid>()
                .map_err(|e| AppError::BadRequest(format!("Invalid practice id '{}': {}", s, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let response = queries::list_jobs::handle(
        state.db,
        ListJobsQuery {
            practice_ids,
            status: params.status,
            limit: params.limit,
        },
    )
    .await?;

    let meta = json!({ "total": response.total });
    Ok(ApiResponse::success_with_meta(response.jobs, meta).into_response())
}

async fn get_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response = queries::get_job::handle(state.db, GetJobQuery { job_id: id }).await?;
    Ok(ApiResponse::success(response.job).into_response())
}

#[tracing::instrument(skip(state), fields(job_id = %id))]
async fn process_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response = commands::process::handle(
        state.db,
        state.store,
        state.config.insert_chunk_size,
        ProcessJobCommand { job_id: id },
    )
    .await?;
    Ok(ApiResponse::success(response.job).into_response())
}

#[derive(Debug, Deserialize)]
struct GetRecordsParams {
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn get_records(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Query(params): Query<GetRecordsParams>,
) -> Result<Response, AppError> {
    let response = queries::get_records::handle(
        state.db,
        GetRecordsQuery {
            job_id: id,
            limit: params.limit,
            offset: params.offset,
        },
    )
    .await?;

    let meta = json!({
        "total": response.total,
        "limit": response.limit,
        "offset": response.offset,
    });
    Ok(ApiResponse::success_with_meta(response.records, meta).into_response())
}

async fn get_headers(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response = queries::get_headers::handle(state.db, GetHeadersQuery { job_id: id }).await?;
    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug, Deserialize)]
struct SuggestMappingParams {
    #[serde(default = "default_target")]
    target: String,
}

fn default_target() -> String {
    "patients".to_string()
}

async fn suggest_mapping(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Query(params): Query<SuggestMappingParams>,
) -> Result<Response, AppError> {
    let response = queries::suggest_mapping::handle(
        state.db,
        SuggestMappingQuery {
            job_id: id,
            target: params.target,
        },
    )
    .await?;
    Ok(ApiResponse::success(response).into_response())
}

#[derive(Debug, Deserialize)]
struct SaveMappingBody {
    #[serde(default = "default_target")]
    target: String,
    field_map: BTreeMap<String, String>,
    created_by: Option<Uuid>,
}

async fn save_mapping(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SaveMappingBody>,
) -> Result<Response, AppError> {
    let response = commands::save_mapping::handle(
        state.db,
        SaveMappingCommand {
            job_id: id,
            target: body.target,
            field_map: body.field_map,
            created_by: body.created_by,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(response.template))).into_response())
}

#[derive(Debug, Deserialize)]
struct PromoteBody {
    #[serde(default = "default_target")]
    target: String,
    field_map: BTreeMap<String, String>,
}

#[tracing::instrument(skip(state, body), fields(job_id = %id))]
async fn promote_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
    Json(body): Json<PromoteBody>,
) -> Result<Response, AppError> {
    let response = commands::promote::handle(
        state.db,
        state.config.promote_ceiling,
        PromoteJobCommand {
            job_id: id,
            target: body.target,
            field_map: body.field_map,
        },
    )
    .await?;
    Ok(ApiResponse::success(response).into_response())
}

async fn cancel_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response = commands::cancel::handle(state.db, CancelJobCommand { job_id: id }).await?;
    Ok(ApiResponse::success(response.job).into_response())
}

async fn delete_job(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response =
        commands::delete::handle(state.db, state.store, DeleteJobCommand { job_id: id }).await?;
    Ok(ApiResponse::success(response).into_response())
}

async fn download(
    State(state): State<FeatureState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let response =
        queries::download::handle(state.db, state.store, DownloadExportQuery { job_id: id })
            .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        response.original_filename.replace('"', "")
    );
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type_for(&response.original_filename).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        response.content,
    )
        .into_response())
}

fn content_type_for(filename: &str) -> &'static str {
    match FileType::from_filename(filename) {
        FileType::Csv => "text/csv",
        FileType::Pdf => "application/pdf",
        FileType::Json => "application/json",
        FileType::Txt => "text/plain",
        FileType::Unknown => "application/octet-stream",
    }
}

impl From<UploadExportError> for AppError {
    fn from(err: UploadExportError) -> Self {
        match err {
            UploadExportError::Storage(e) => AppError::InternalError(e.to_string()),
            UploadExportError::Database(e) => AppError::Database(e),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<ProcessJobError> for AppError {
    fn from(err: ProcessJobError) -> Self {
        match err {
            ProcessJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            ProcessJobError::InvalidStatus(_) => AppError::Conflict(err.to_string()),
            ProcessJobError::Parser(_) => AppError::BadRequest(err.to_string()),
            ProcessJobError::Storage(e) => AppError::InternalError(e.to_string()),
            ProcessJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<SaveMappingError> for AppError {
    fn from(err: SaveMappingError) -> Self {
        match err {
            SaveMappingError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            SaveMappingError::Database(e) => AppError::Database(e),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<PromoteJobError> for AppError {
    fn from(err: PromoteJobError) -> Self {
        match err {
            PromoteJobError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            PromoteJobError::Database(e) => AppError::Database(e),
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<CancelJobError> for AppError {
    fn from(err: CancelJobError) -> Self {
        match err {
            CancelJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            CancelJobError::AlreadyTerminal(_) => AppError::Conflict(err.to_string()),
            CancelJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DeleteJobError> for AppError {
    fn from(err: DeleteJobError) -> Self {
        match err {
            DeleteJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            DeleteJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetJobError> for AppError {
    fn from(err: GetJobError) -> Self {
        match err {
            GetJobError::NotFound(_) => AppError::NotFound(err.to_string()),
            GetJobError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<ListJobsError> for AppError {
    fn from(err: ListJobsError) -> Self {
        match err {
            ListJobsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetRecordsError> for AppError {
    fn from(err: GetRecordsError) -> Self {
        match err {
            GetRecordsError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            GetRecordsError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<GetHeadersError> for AppError {
    fn from(err: GetHeadersError) -> Self {
        match err {
            GetHeadersError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            GetHeadersError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<SuggestMappingError> for AppError {
    fn from(err: SuggestMappingError) -> Self {
        match err {
            SuggestMappingError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            SuggestMappingError::UnsupportedTarget(_) => AppError::BadRequest(err.to_string()),
            SuggestMappingError::Database(e) => AppError::Database(e),
        }
    }
}

impl From<DownloadExportError> for AppError {
    fn from(err: DownloadExportError) -> Self {
        match err {
            DownloadExportError::JobNotFound(_) => AppError::NotFound(err.to_string()),
            DownloadExportError::Storage(e) => AppError::InternalError(e.to_string()),
            DownloadExportError::Database(e) => AppError::Database(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_for_known_extensions() {
        assert_eq!(content_type_for("report.pdf"), "application/pdf");
        assert_eq!(content_type_for("patients.csv"), "text/csv");
        assert_eq!(content_type_for("blob.bin"), "application/octet-stream");
    }

    #[test]
    fn test_invalid_status_maps_to_conflict() {
        let err: AppError = ProcessJobError::InvalidStatus(JobStatus::Processing).into();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_not_found_maps_to_not_found() {
        let err: AppError = GetJobError::NotFound(Uuid::nil()).into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}

//! HTTP server.
//!
//! Exposes the autonomous processing pipeline and job history as a JSON
//! HTTP API for the browsing UI and upstream document-analysis services.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/autonomous-process` | Run the pipeline for a job |
//! | `POST` | `/jobs` | Create a job |
//! | `GET`  | `/jobs` | List jobs, newest first |
//! | `GET`  | `/jobs/{id}` | One job |
//! | `GET`  | `/jobs/{id}/content` | Category view and artifact rows of a job |
//! | `DELETE` | `/jobs/{id}` | Delete a job, its rows and its blobs |
//! | `GET`  | `/files/{*path}` | Download a filesystem-backend artifact |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "success": false, "error": "job not found: 9f1c...", "code": "not_found" }
//! ```
//!
//! Codes: `bad_request` (400, malformed or invalid payload), `not_found`
//! (404), `internal` (500, any other top-level failure).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use topicforge_core::history;
use topicforge_core::models::{ArtifactRecord, CategoryResult, Job};

use crate::blob_fs::FsBlobStore;
use crate::config::Config;
use crate::jobs::create_job;
use crate::pipeline::{Pipeline, ProcessRequest, ProcessResponse};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    /// Present only for the filesystem storage backend.
    files: Option<Arc<FsBlobStore>>,
}

/// Build the router over an already-wired pipeline.
///
/// `files` enables `GET /files/{*path}`; pass `None` when artifacts live in
/// an external object store.
pub fn build_router(pipeline: Arc<Pipeline>, files: Option<FsBlobStore>) -> Router {
    let state = AppState {
        pipeline,
        files: files.map(Arc::new),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/autonomous-process", post(handle_process))
        .route("/jobs", post(handle_create_job).get(handle_list_jobs))
        .route("/jobs/{id}", get(handle_get_job).delete(handle_delete_job))
        .route("/jobs/{id}/content", get(handle_job_content))
        .route("/files/{*path}", get(handle_file))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config).await?);
    let files = match config.storage.backend.as_str() {
        "filesystem" => Some(FsBlobStore::new(
            config.storage.root.clone(),
            config.storage.public_base_url.clone(),
        )),
        _ => None,
    };

    let app = build_router(pipeline, files);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "server listening");
    println!("Topicforge server listening on http://{}", config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    code: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: message.into(),
    }
}

/// Map a pipeline or store error onto the most appropriate status.
fn classify_error(err: anyhow::Error) -> AppError {
    let msg = format!("{:#}", err);

    if msg.contains("not found") {
        not_found(msg)
    } else if msg.contains("must not be") || msg.contains("invalid topic") {
        bad_request(msg)
    } else {
        error!(error = %msg, "request failed");
        internal(msg)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /autonomous-process ============

/// Runs the whole pipeline inline and answers once the job is complete.
async fn handle_process(
    State(state): State<AppState>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    let response = state
        .pipeline
        .process(&request)
        .await
        .map_err(classify_error)?;
    Ok(Json(response))
}

// ============ Jobs ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateJobRequest {
    file_name: String,
    #[serde(default)]
    file_size: i64,
}

async fn handle_create_job(
    State(state): State<AppState>,
    payload: Result<Json<CreateJobRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;
    let job = create_job(state.pipeline.metadata(), &request.file_name, request.file_size)
        .await
        .map_err(classify_error)?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[derive(Serialize)]
struct JobListResponse {
    jobs: Vec<Job>,
}

async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<JobListResponse>, AppError> {
    let jobs = state
        .pipeline
        .metadata()
        .list_jobs()
        .await
        .map_err(classify_error)?;
    Ok(Json(JobListResponse { jobs }))
}

async fn find_job(state: &AppState, id: &str) -> Result<Job, AppError> {
    state
        .pipeline
        .metadata()
        .get_job(id)
        .await
        .map_err(classify_error)?
        .ok_or_else(|| not_found(format!("job not found: {}", id)))
}

async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(find_job(&state, &id).await?))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JobContentResponse {
    job_id: String,
    results: Vec<CategoryResult>,
    records: Vec<ArtifactRecord>,
}

async fn handle_job_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobContentResponse>, AppError> {
    find_job(&state, &id).await?;

    let records = state
        .pipeline
        .metadata()
        .list_artifacts(&id)
        .await
        .map_err(classify_error)?;
    let results = history::category_view(&records, state.pipeline.blobs());

    Ok(Json(JobContentResponse {
        job_id: id,
        results,
        records,
    }))
}

async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let deleted = history::delete_job(state.pipeline.metadata(), state.pipeline.blobs(), &id)
        .await
        .map_err(classify_error)?;
    if !deleted {
        return Err(not_found(format!("job not found: {}", id)));
    }
    Ok(Json(serde_json::json!({ "success": true, "jobId": id })))
}

// ============ GET /files/{*path} ============

async fn handle_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, AppError> {
    let files = state
        .files
        .as_ref()
        .ok_or_else(|| not_found("file serving is only available for the filesystem backend"))?;
    let target = files.resolve(&path).map_err(|e| bad_request(e.to_string()))?;

    let bytes = match tokio::fs::read(&target).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(not_found(format!("file not found: {}", path)));
        }
        Err(e) => return Err(internal(e.to_string())),
    };

    let content_type = if path.ends_with(".md") {
        "text/markdown; charset=utf-8"
    } else {
        "application/octet-stream"
    };

    Ok(([(header::CONTENT_TYPE, content_type)], Body::from(bytes)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_classify_error_statuses() {
        let missing = classify_error(anyhow!("job abc not found"));
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let empty = classify_error(anyhow!("jobId must not be empty"));
        assert_eq!(empty.status, StatusCode::BAD_REQUEST);

        let topic: anyhow::Result<()> = Err(anyhow!("confidence must be in [0, 100]"));
        let topic = topic.context("invalid topic at index 2").unwrap_err();
        assert_eq!(classify_error(topic).status, StatusCode::BAD_REQUEST);

        let store = classify_error(anyhow!("database is locked"));
        assert_eq!(store.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

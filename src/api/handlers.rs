//! API request handlers
//!
//! Handlers for all REST API endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::ConsolidateConfig;
use crate::error::{ConsolidateError, ConsolidateResult};
use crate::export::write_outputs;
use crate::pipeline::{Consolidator, FileOutcome};
use crate::schema::SchemaPreset;

use super::server::AppState;

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Root endpoint response
#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize)]
pub struct EndpointInfo {
    pub path: String,
    pub method: String,
    pub description: String,
}

impl EndpointInfo {
    fn new(path: &str, method: &str, description: &str) -> Self {
        Self {
            path: path.to_string(),
            method: method.to_string(),
            description: description.to_string(),
        }
    }
}

/// GET / - Root info
pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let response = RootResponse {
        name: "Consolidator API Server".to_string(),
        version: state.version.clone(),
        description: "HTTP API for consolidating Excel / CSV work reports".to_string(),
        endpoints: vec![
            EndpointInfo::new("/health", "GET", "Health check endpoint"),
            EndpointInfo::new("/version", "GET", "Get server version"),
            EndpointInfo::new("/api/v1/schema", "GET", "List canonical columns"),
            EndpointInfo::new(
                "/api/v1/consolidate",
                "POST",
                "Consolidate files into one Excel workbook",
            ),
        ],
    };
    Json(ApiResponse::ok(response))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

/// GET /health - Health check
pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub features: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        features: vec!["schema".to_string(), "consolidate".to_string()],
    }))
}

/// Schema query
#[derive(Deserialize, Default)]
pub struct SchemaQuery {
    pub preset: Option<String>,
}

/// Schema response
#[derive(Serialize)]
pub struct SchemaResponse {
    pub preset: String,
    pub provenance_column: String,
    pub required_column: String,
    pub columns: Vec<String>,
}

/// Build the schema description for a preset name (default preset when absent)
pub fn schema_for(preset: Option<&str>) -> ConsolidateResult<SchemaResponse> {
    let mut config = ConsolidateConfig::default();
    if let Some(name) = preset {
        config.schema.preset = name.parse::<SchemaPreset>()?;
    }
    let catalog = config.catalog()?;
    Ok(SchemaResponse {
        preset: config.schema.preset.name().to_string(),
        provenance_column: config.schema.provenance_column,
        required_column: config.schema.required_column,
        columns: catalog.columns().to_vec(),
    })
}

/// GET /api/v1/schema - Canonical columns
pub async fn schema(Query(query): Query<SchemaQuery>) -> impl IntoResponse {
    match schema_for(query.preset.as_deref()) {
        Ok(response) => (StatusCode::OK, Json(ApiResponse::ok(response))),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ApiResponse::err(e.to_string()))),
    }
}

/// Consolidate request
#[derive(Deserialize)]
pub struct ConsolidateRequest {
    pub files: Vec<String>,
    pub output_path: String,
    #[serde(default)]
    pub log_path: Option<String>,
    #[serde(default)]
    pub config: Option<ConsolidateConfig>,
}

/// Consolidate response
#[derive(Serialize)]
pub struct ConsolidateResponse {
    pub rows: usize,
    pub files_total: usize,
    pub files_failed: usize,
    pub output_path: String,
    pub log_path: Option<String>,
    pub diagnostics: Vec<String>,
    pub files: Vec<FileOutcome>,
}

/// Run a consolidation request synchronously.
///
/// The sheet picker is never available here: a workbook that needs one is
/// reported as a failed file.
pub fn consolidate_files(req: ConsolidateRequest) -> ConsolidateResult<ConsolidateResponse> {
    if req.files.is_empty() {
        return Err(ConsolidateError::Validation(
            "Request contains no files".to_string(),
        ));
    }

    let config = req.config.unwrap_or_default();
    let output_path = PathBuf::from(&req.output_path);
    let log_path = req
        .log_path
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output.log.clone());
    let output_config = config.output.clone();

    let consolidator = Consolidator::new(config)?;
    let paths: Vec<PathBuf> = req.files.iter().map(PathBuf::from).collect();
    let report = consolidator.run_paths(&paths, |_| {});
    let written = write_outputs(&report, &output_config, &output_path, &log_path)?;

    Ok(ConsolidateResponse {
        rows: report.rows(),
        files_total: report.files.len(),
        files_failed: report.files_failed(),
        output_path: written.workbook.display().to_string(),
        log_path: written.log.map(|p| p.display().to_string()),
        diagnostics: report.diagnostics.lines(),
        files: report.files,
    })
}

/// POST /api/v1/consolidate - Consolidate files into one workbook
pub async fn consolidate(Json(req): Json<ConsolidateRequest>) -> impl IntoResponse {
    let files = req.files.len();
    let result = tokio::task::spawn_blocking(move || consolidate_files(req)).await;

    match result {
        Ok(Ok(response)) => {
            info!(files, rows = response.rows, "consolidation request served");
            (StatusCode::OK, Json(ApiResponse::ok(response)))
        }
        Ok(Err(e)) => {
            let status = match e {
                ConsolidateError::Configuration(_) | ConsolidateError::Validation(_) => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, Json(ApiResponse::err(e.to_string())))
        }
        Err(join_error) => {
            error!(error = %join_error, "consolidation task failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err("Consolidation task failed")),
            )
        }
    }
}

//! HTTP request handlers
//!
//! Implements the sample selection, delivery, archive, and status endpoints.

use crate::api::auth::bearer_matches;
use crate::error::{Error, Result};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use riffle_common::api::{
    ArchiveRequest, ArchiveResponse, AuthStatusResponse, HealthResponse, SampleResponse,
};
use riffle_common::naming;
use tracing::{error, info};

/// Media type served for every sample in the library
const SAMPLE_CONTENT_TYPE: &str = "audio/wav";

/// GET /health - Health check endpoint (no auth)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "riffle-sv".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /auth/status - Report whether the presented credential passes the gate
pub async fn auth_status(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<AuthStatusResponse> {
    Json(AuthStatusResponse {
        is_authenticated: bearer_matches(&state.api_token, &headers),
    })
}

/// GET /api/sample - Select one random sample
///
/// Returns the transport-safe display name alongside the storage name the
/// client echoes back when archiving.
pub async fn get_sample(State(state): State<AppState>) -> Result<Json<SampleResponse>> {
    let descriptor = state.library.pick().map_err(|e| {
        error!("Sample selection failed: {}", e);
        e
    })?;

    info!(sample = %descriptor.storage_name, "Selected sample");

    Ok(Json(SampleResponse {
        file: descriptor.display_name,
        original_file: descriptor.storage_name,
    }))
}

/// GET /api/sample/:file - Deliver one sample's bytes
///
/// The path parameter is a display name; it is decoded and resolved under
/// the library root before anything is read. Missing files and traversal
/// attempts are both 404.
pub async fn deliver_sample(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response> {
    let path = state.library.resolve(&file)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        error!("Failed to read {}: {}", path.display(), e);
        Error::NotFound(file.clone())
    })?;

    info!(file = %file, size = bytes.len(), "Delivering sample");

    Ok(([(header::CONTENT_TYPE, SAMPLE_CONTENT_TYPE)], bytes).into_response())
}

/// POST /api/add-to-drive - Archive the named sample to cloud storage
pub async fn add_to_drive(
    State(state): State<AppState>,
    Json(req): Json<ArchiveRequest>,
) -> Result<Json<ArchiveResponse>> {
    let Some(archive) = state.archive.as_ref() else {
        error!("Archive request received but no archive credential is configured");
        return Err(Error::Upload("archive storage not configured".to_string()));
    };

    let storage_name = naming::decode(&req.file_name);
    let path = state.library.resolve(&req.file_name)?;

    info!(sample = %storage_name, "Archiving sample");

    archive
        .archive_file(&storage_name, &path)
        .await
        .map_err(|e| {
            error!("Archive failed for {}: {}", storage_name, e);
            e
        })?;

    Ok(Json(ArchiveResponse {
        message: "File added to Drive successfully".to_string(),
    }))
}

//! Shared API request/response types
//!
//! Types used by both riffle-sv (as responses) and riffle-se (as parsed
//! replies). All JSON fields are camelCase per the wire contract.

use serde::{Deserialize, Serialize};

/// Response body for `GET /api/sample`
///
/// `file` is the transport-safe display name used in the delivery URL;
/// `original_file` is the on-disk storage name, which the client echoes
/// back verbatim when archiving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleResponse {
    pub file: String,
    pub original_file: String,
}

/// Request body for `POST /api/add-to-drive`
///
/// Carries the display name of the sample to archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRequest {
    pub file_name: String,
}

/// Response body for a successful `POST /api/add-to-drive`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveResponse {
    pub message: String,
}

/// Response body for `GET /auth/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub is_authenticated: bool,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// Error envelope returned with non-2xx statuses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

//! Error types for riffle-sv
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation, plus the HTTP status mapping used by every handler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use riffle_common::api::ErrorResponse;
use thiserror::Error;

/// Main error type for the sample server
#[derive(Error, Debug)]
pub enum Error {
    /// Library directory could not be read
    #[error("Failed to read sample library: {0}")]
    LibraryRead(std::io::Error),

    /// Library contains no matching sample files
    #[error("Sample library is empty")]
    EmptyLibrary,

    /// Requested sample missing, or resolved path escapes the library root
    #[error("File not found: {0}")]
    NotFound(String),

    /// Archive transport failure
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Request failed the authentication gate
    #[error("Unauthorized")]
    Unauthorized,

    /// File I/O error
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the riffle-sv Error
pub type Result<T> = std::result::Result<T, Error>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized => StatusCode::UNAUTHORIZED,
            Error::LibraryRead(_)
            | Error::EmptyLibrary
            | Error::Upload(_)
            | Error::Io(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

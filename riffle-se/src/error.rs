//! Error types for riffle-se
//!
//! Every failure here is non-fatal to the session loop: network, decode,
//! and audio errors are logged and leave the session interactive.

use thiserror::Error;

/// Main error type for the session engine
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server replied with a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Audio decoding failed (malformed or unsupported data)
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output error
    #[error("Audio output error: {0}")]
    Audio(String),

    /// The server reports the session as unauthenticated
    #[error("Not authenticated")]
    Unauthenticated,

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Convenience Result type using the riffle-se Error
pub type Result<T> = std::result::Result<T, Error>;

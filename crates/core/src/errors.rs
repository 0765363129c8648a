//! Error types

use thiserror::Error;

/// Upstream provider errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{source_name} request failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        source_name: &'static str,
        attempts: u32,
        last_error: String,
    },

    #[error("Source disabled: {0}")]
    Disabled(&'static str),
}

/// Result type alias
pub type SourceResult<T> = Result<T, SourceError>;

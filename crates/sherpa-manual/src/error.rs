//! Error types for manual lookups.

use sherpa_core::error::SherpaError;

/// Errors from the manual question-answering service.
#[derive(Debug, thiserror::Error)]
pub enum ManualError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("answer blocked: {0}")]
    Blocked(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ManualError> for SherpaError {
    fn from(err: ManualError) -> Self {
        SherpaError::Manual(err.to_string())
    }
}

//! Error types for the conversational core.

use sherpa_core::error::SherpaError;
use sherpa_core::types::Capability;
use sherpa_manual::ManualError;
use sherpa_places::PlacesError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("no handler registered for {0}")]
    NoHandler(Capability),
    #[error("manual lookup failed: {0}")]
    Manual(#[from] ManualError),
    #[error("places lookup failed: {0}")]
    Places(#[from] PlacesError),
    #[error("session state error: {0}")]
    State(String),
}

impl From<ChatError> for SherpaError {
    fn from(err: ChatError) -> Self {
        SherpaError::Chat(err.to_string())
    }
}

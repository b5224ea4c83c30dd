use thiserror::Error;

use crate::config::ConfigError;

/// Top-level error type for Electric Sherpa.
///
/// Collaborator crates define their own error types and implement
/// `From<CrateError> for SherpaError` so that `?` works across crate
/// boundaries, up to the composition root.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SherpaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Places lookup error: {0}")]
    Places(String),

    #[error("Manual lookup error: {0}")]
    Manual(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ConfigError> for SherpaError {
    fn from(err: ConfigError) -> Self {
        SherpaError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for SherpaError {
    fn from(err: toml::de::Error) -> Self {
        SherpaError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SherpaError {
    fn from(err: toml::ser::Error) -> Self {
        SherpaError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SherpaError {
    fn from(err: serde_json::Error) -> Self {
        SherpaError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Electric Sherpa operations.
pub type Result<T> = std::result::Result<T, SherpaError>;

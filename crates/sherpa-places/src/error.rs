//! Error types for places lookups.

use sherpa_core::error::SherpaError;

/// Errors from the geocoding and places services.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("request timed out after {0} seconds")]
    Timeout(u64),
    #[error("{service} returned {status}{}", detail_suffix(.message))]
    ApiStatus {
        service: &'static str,
        status: String,
        message: Option<String>,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
}

fn detail_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl From<PlacesError> for SherpaError {
    fn from(err: PlacesError) -> Self {
        SherpaError::Places(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_places_error_display() {
        let err = PlacesError::Request("connection refused".to_string());
        assert_eq!(err.to_string(), "request failed: connection refused");

        let err = PlacesError::Timeout(30);
        assert_eq!(err.to_string(), "request timed out after 30 seconds");

        let err = PlacesError::Malformed("missing geometry".to_string());
        assert_eq!(err.to_string(), "malformed response: missing geometry");
    }

    #[test]
    fn test_api_status_display_with_and_without_message() {
        let err = PlacesError::ApiStatus {
            service: "geocoding",
            status: "REQUEST_DENIED".to_string(),
            message: Some("The provided API key is invalid.".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "geocoding returned REQUEST_DENIED: The provided API key is invalid."
        );

        let err = PlacesError::ApiStatus {
            service: "places search",
            status: "OVER_QUERY_LIMIT".to_string(),
            message: None,
        };
        assert_eq!(err.to_string(), "places search returned OVER_QUERY_LIMIT");
    }

    #[test]
    fn test_into_sherpa_error() {
        let err: SherpaError = PlacesError::Timeout(5).into();
        assert!(matches!(err, SherpaError::Places(_)));
    }
}

//! Application configuration.
//!
//! Tunables come from a TOML file; credentials come from the process
//! environment (optionally seeded from a `.env` file) and are never written
//! back to disk.
//!
//! # Environment Variables
//!
//! ## Required
//! - `GOOGLE_API_KEY` - API key for the generative language / Vertex AI endpoint
//! - `GOOGLE_CLOUD_PROJECT` - Google Cloud project that owns the RAG corpus
//! - `GOOGLE_CLOUD_LOCATION` - Vertex AI region (e.g. `us-central1`)
//! - `CORPORA_NAME` - full resource name of the manual RAG corpus
//! - `GMAPS_API_KEY` - Google Maps web services key
//!
//! ## Optional
//! - `GOOGLE_ACCESS_TOKEN` - OAuth bearer token, sent instead of the API key

use std::path::Path;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{Result, SherpaError};

/// Errors raised while reading credentials from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Top-level configuration.
///
/// Loaded from `~/.electric-sherpa/config.toml` by default. Every section
/// falls back to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SherpaConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub manual: ManualConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl SherpaConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SherpaConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SherpaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Name the assistant uses for itself in the shell.
    pub assistant_name: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            assistant_name: "Electric_Sherpa".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Conversation and routing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum accepted utterance length in characters.
    pub max_message_length: usize,
    /// Maximum number of places listed in a reply.
    pub max_results: usize,
    /// Idle minutes after which a session is discarded.
    pub session_timeout_minutes: u32,
    /// Maximum number of utterances kept in a session transcript.
    pub transcript_limit: usize,
    /// Vehicle model seeded into every new session, if any.
    pub initial_vehicle_model: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_message_length: 2000,
            max_results: 5,
            session_timeout_minutes: 30,
            transcript_limit: 200,
            initial_vehicle_model: None,
        }
    }
}

/// Manual question-answering (Vertex AI RAG) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    /// Generative model used to answer manual questions.
    pub model: String,
    /// Number of corpus chunks retrieved per question.
    pub similarity_top_k: u32,
    /// Maximum vector distance for a retrieved chunk.
    pub vector_distance_threshold: f64,
    /// Override for the Vertex AI endpoint base URL.
    pub base_url: Option<String>,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-001".to_string(),
            similarity_top_k: 10,
            vector_distance_threshold: 0.5,
            base_url: None,
        }
    }
}

/// Geocoding and places search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacesConfig {
    /// Search radius around the geocoded address, in metres.
    pub radius_m: u32,
    /// Base URL of the Google Maps web services.
    pub base_url: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            radius_m: 10_000,
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
        }
    }
}

/// Outbound HTTP settings shared by all collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds. Failed requests are not retried.
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
        }
    }
}

/// HTTP chat server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port the server binds to on localhost.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3040 }
    }
}

/// Credentials and resource identifiers for the hosted services.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct Credentials {
    pub google_api_key: SecretString,
    pub google_cloud_project: String,
    pub google_cloud_location: String,
    pub corpus_name: String,
    pub gmaps_api_key: SecretString,
    pub google_access_token: Option<SecretString>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &"[REDACTED]")
            .field("google_cloud_project", &self.google_cloud_project)
            .field("google_cloud_location", &self.google_cloud_location)
            .field("corpus_name", &self.corpus_name)
            .field("gmaps_api_key", &"[REDACTED]")
            .field(
                "google_access_token",
                &self.google_access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Credentials {
    /// Load credentials from the process environment.
    ///
    /// Calls `dotenvy::dotenv()` first so a `.env` file in the working
    /// directory is honoured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or empty.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        report_dotenv(dotenvy::dotenv());
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build credentials from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            google_api_key: SecretString::from(required(&lookup, "GOOGLE_API_KEY")?),
            google_cloud_project: required(&lookup, "GOOGLE_CLOUD_PROJECT")?,
            google_cloud_location: required(&lookup, "GOOGLE_CLOUD_LOCATION")?,
            corpus_name: required(&lookup, "CORPORA_NAME")?,
            gmaps_api_key: SecretString::from(required(&lookup, "GMAPS_API_KEY")?),
            google_access_token: lookup("GOOGLE_ACCESS_TOKEN")
                .filter(|v| !v.trim().is_empty())
                .map(SecretString::from),
        })
    }
}

/// Log a `.env` file that exists but could not be loaded. Returns whether
/// anything was reported; a missing file is not.
fn report_dotenv(result: std::result::Result<std::path::PathBuf, dotenvy::Error>) -> bool {
    match result {
        Ok(path) => {
            info!("Environment loaded from {}", path.display());
            false
        }
        Err(e) if e.not_found() => false,
        Err(e) => {
            warn!(error = %e, "Failed to load .env file");
            true
        }
    }
}

fn required<F>(lookup: &F, key: &str) -> std::result::Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn full_env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("GOOGLE_API_KEY", "g-key".to_string()),
            ("GOOGLE_CLOUD_PROJECT", "ev-project".to_string()),
            ("GOOGLE_CLOUD_LOCATION", "us-central1".to_string()),
            (
                "CORPORA_NAME",
                "projects/ev-project/locations/us-central1/ragCorpora/123".to_string(),
            ),
            ("GMAPS_API_KEY", "maps-key".to_string()),
        ])
    }

    #[test]
    fn test_default_config() {
        let config = SherpaConfig::default();
        assert_eq!(config.general.assistant_name, "Electric_Sherpa");
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.chat.max_results, 5);
        assert!(config.chat.initial_vehicle_model.is_none());
        assert_eq!(config.manual.model, "gemini-2.0-flash-001");
        assert_eq!(config.manual.similarity_top_k, 10);
        assert_eq!(config.manual.vector_distance_threshold, 0.5);
        assert_eq!(config.places.radius_m, 10_000);
        assert_eq!(config.http.request_timeout_secs, 30);
        assert_eq!(config.server.port, 3040);
    }

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[chat]
max_results = 3
initial_vehicle_model = "Hyundai Ioniq 5"

[places]
radius_m = 5000

[http]
request_timeout_secs = 10
"#;
        let file = create_temp_config(content);
        let config = SherpaConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.chat.max_results, 3);
        assert_eq!(
            config.chat.initial_vehicle_model.as_deref(),
            Some("Hyundai Ioniq 5")
        );
        assert_eq!(config.places.radius_m, 5000);
        assert_eq!(config.http.request_timeout_secs, 10);
        // Untouched sections keep defaults
        assert_eq!(config.manual.similarity_top_k, 10);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = SherpaConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.places.radius_m, 10_000);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[chat\nmax_results = ");
        let err = SherpaConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, SherpaError::Config(_)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = SherpaConfig::default();
        config.chat.max_results = 8;
        config.save(&path).unwrap();

        let reloaded = SherpaConfig::load(&path).unwrap();
        assert_eq!(reloaded.chat.max_results, 8);
        assert_eq!(reloaded.places.base_url, config.places.base_url);
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = SherpaConfig::load(file.path()).unwrap();
        assert_eq!(config.chat.session_timeout_minutes, 30);
        assert_eq!(config.server.port, 3040);
    }

    #[test]
    fn test_credentials_from_lookup() {
        let env = full_env();
        let creds = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(creds.google_api_key.expose_secret(), "g-key");
        assert_eq!(creds.google_cloud_project, "ev-project");
        assert_eq!(creds.google_cloud_location, "us-central1");
        assert_eq!(creds.gmaps_api_key.expose_secret(), "maps-key");
        assert!(creds.google_access_token.is_none());
    }

    #[test]
    fn test_credentials_missing_variable() {
        let mut env = full_env();
        env.remove("GMAPS_API_KEY");
        let err = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "GMAPS_API_KEY"));
    }

    #[test]
    fn test_credentials_blank_variable_rejected() {
        let mut env = full_env();
        env.insert("CORPORA_NAME", "   ".to_string());
        let err = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref k, _) if k == "CORPORA_NAME"));
    }

    #[test]
    fn test_credentials_optional_access_token() {
        let mut env = full_env();
        env.insert("GOOGLE_ACCESS_TOKEN", "ya29.token".to_string());
        let creds = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(
            creds.google_access_token.unwrap().expose_secret(),
            "ya29.token"
        );
    }

    #[test]
    fn test_credentials_debug_redacts_secrets() {
        let env = full_env();
        let creds = Credentials::from_lookup(|k| env.get(k).cloned()).unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("g-key"));
        assert!(!debug.contains("maps-key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("ev-project"));
    }

    #[test]
    fn test_report_dotenv_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let result = dotenvy::from_path(&path).map(|()| path.clone());
        assert!(!report_dotenv(result));
    }

    #[test]
    fn test_report_dotenv_flags_malformed_file() {
        let file = create_temp_config("SHERPA_TEST_UNTERMINATED='no closing quote\n");
        let result = dotenvy::from_path(file.path()).map(|()| file.path().to_path_buf());
        assert!(result.is_err());
        assert!(report_dotenv(result));
    }
}

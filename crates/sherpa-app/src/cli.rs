//! CLI argument definitions for the Electric Sherpa binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Electric Sherpa, an assistant for EV owners.
#[derive(Parser, Debug)]
#[command(name = "electric-sherpa", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", env = "SHERPA_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Talk to the assistant in the terminal (default).
    Chat,
    /// Serve the chat API over HTTP.
    Serve {
        /// API server port.
        #[arg(short = 'p', long = "port", env = "SHERPA_PORT")]
        port: Option<u16>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > SHERPA_CONFIG env var > ~/.electric-sherpa/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        match self.config {
            Some(ref p) => p.clone(),
            None => default_config_path(),
        }
    }

    /// Resolve the log level, falling back to the configured one.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

impl Command {
    /// Resolve the API server port.
    ///
    /// Priority: --port flag > SHERPA_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        match self {
            Command::Serve { port: Some(p) } => *p,
            _ => config_port,
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home)
            .join(".electric-sherpa")
            .join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".electric-sherpa")
            .join("config.toml");
    }
    PathBuf::from("config.toml")
}

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigError, Credentials, SherpaConfig};
pub use error::{Result, SherpaError};
pub use types::*;

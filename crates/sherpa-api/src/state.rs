//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use sherpa_chat::ChatOrchestrator;
use sherpa_core::config::SherpaConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<SherpaConfig>,
    /// Turn loop and session store.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: SherpaConfig, orchestrator: ChatOrchestrator) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}

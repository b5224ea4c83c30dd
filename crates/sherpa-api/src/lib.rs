//! HTTP surface for the EV assistant.
//!
//! Exposes the chat turn loop and session history over a small JSON API
//! served with axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;

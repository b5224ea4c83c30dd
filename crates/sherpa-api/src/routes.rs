//! Router setup with all API routes and middleware.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use sherpa_core::error::SherpaError;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Browser access only from pages served on the same local port.
    let port = state.config.server.port;
    let origins: Vec<HeaderValue> = ["127.0.0.1", "localhost"]
        .iter()
        .filter_map(|host| format!("http://{host}:{port}").parse().ok())
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{id}", delete(handlers::delete_session))
        .route("/sessions/{id}/history", get(handlers::session_history))
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API on 127.0.0.1 at the configured port until the process
/// is interrupted.
pub async fn start_server(state: AppState) -> Result<(), SherpaError> {
    let addr = format!("127.0.0.1:{}", state.config.server.port);
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| SherpaError::Api(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("Starting API server on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await
        .map_err(|e| SherpaError::Api(format!("Server error: {e}")))?;

    tracing::info!("API server stopped");
    Ok(())
}

//! Route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sherpa_chat::{ReplyKind, SessionSummary, Utterance};
use sherpa_core::types::Capability;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.orchestrator.list_sessions().len(),
    })
}

// =============================================================================
// Chat
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue this session. A new one is started when absent, unknown or
    /// expired.
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

/// Response body for POST /chat.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReplyBody {
    pub session_id: Uuid,
    pub reply: String,
    pub kind: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReplyBody>, ApiError> {
    let (response, session_id) = state
        .orchestrator
        .handle_message(&req.message, req.session_id)
        .await?;

    Ok(Json(ChatReplyBody {
        session_id,
        reply: response.reply,
        kind: response.kind,
        capability: response.capability,
    }))
}

// =============================================================================
// Sessions
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub messages: Vec<Utterance>,
}

/// GET /sessions
pub async fn list_sessions(State(state): State<AppState>) -> Json<SessionsResponse> {
    let mut sessions = state.orchestrator.list_sessions();
    sessions.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    Json(SessionsResponse { sessions })
}

/// GET /sessions/{id}/history
pub async fn session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session_id = parse_session_id(&id)?;
    let messages = state.orchestrator.get_history(session_id)?;
    Ok(Json(HistoryResponse {
        session_id,
        messages,
    }))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = parse_session_id(&id)?;
    state.orchestrator.delete_session(session_id)?;
    tracing::info!(%session_id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid session id: {raw}")))
}

//! Chat orchestrator: the turn loop behind every shell.
//!
//! Owns sessions, routes each utterance, dispatches resolved requests to the
//! handler registry and records both sides of the turn in the transcript.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeZone};
use sherpa_core::config::SherpaConfig;
use sherpa_manual::ManualAnswerer;
use sherpa_places::PlacesLookup;
use uuid::Uuid;

use crate::context::ConversationManager;
use crate::error::ChatError;
use crate::handler::{HandlerOutput, HandlerRegistry};
use crate::response::ResponseGenerator;
use crate::router::CapabilityRouter;
use crate::types::{
    ChatResponse, Role, RouteOutcome, RoutingDecision, Session, SessionSummary, Utterance,
};

/// Central coordinator for chat turns.
pub struct ChatOrchestrator {
    router: CapabilityRouter,
    registry: HandlerRegistry,
    context_manager: ConversationManager,
    response_generator: ResponseGenerator,
    sessions: Mutex<HashMap<Uuid, Session>>,
    max_message_length: usize,
}

impl ChatOrchestrator {
    /// Create an orchestrator dispatching to `registry`.
    pub fn new(config: &SherpaConfig, registry: HandlerRegistry) -> Self {
        let chat = &config.chat;
        Self {
            router: CapabilityRouter::new(),
            registry,
            context_manager: ConversationManager::new(
                chat.session_timeout_minutes,
                chat.transcript_limit,
                chat.initial_vehicle_model.clone(),
            ),
            response_generator: ResponseGenerator::new(chat.max_results, config.places.radius_m),
            sessions: Mutex::new(HashMap::new()),
            max_message_length: chat.max_message_length,
        }
    }

    /// Create an orchestrator with the standard handlers over the given
    /// collaborators.
    pub fn with_collaborators(
        config: &SherpaConfig,
        answerer: Arc<dyn ManualAnswerer>,
        lookup: Arc<dyn PlacesLookup>,
    ) -> Self {
        Self::new(config, HandlerRegistry::with_collaborators(answerer, lookup))
    }

    /// Handle one user utterance.
    ///
    /// Returns the reply and the session ID (new or existing). Collaborator
    /// failures become replies; only invalid input and session state
    /// problems are errors.
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<(ChatResponse, Uuid), ChatError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        let snapshot = self.resolve_session(session_id)?;
        let sid = snapshot.id;

        // The session lock is released while the collaborator runs.
        let routing = self.router.route(text, &snapshot);
        let response = match &routing.outcome {
            RouteOutcome::Clarify { pending, questions } => {
                tracing::info!(session_id = %sid, capability = %pending.capability, missing = questions.len(), "Asking for missing arguments");
                self.response_generator
                    .clarification(pending.capability, questions)
            }
            RouteOutcome::Dispatch(decision) => self.dispatch(sid, decision).await,
            RouteOutcome::Refuse => {
                tracing::info!(session_id = %sid, "Refusing out-of-scope request");
                self.response_generator.refusal()
            }
        };

        let mut sessions = self.lock_sessions()?;
        let session = sessions
            .get_mut(&sid)
            .ok_or(ChatError::SessionNotFound(sid))?;

        self.context_manager.append(session, Role::User, text);
        self.context_manager
            .append(session, Role::Assistant, &response.reply);

        if let Some(model) = &routing.vehicle_model {
            self.context_manager.remember_model(session, model);
        }
        match &routing.outcome {
            RouteOutcome::Clarify { pending, .. } => {
                self.context_manager.set_pending(session, pending)?;
            }
            RouteOutcome::Dispatch(decision) => {
                if let RoutingDecision::Manual { model, .. } = decision {
                    self.context_manager.remember_model(session, model);
                }
                self.context_manager.clear_pending(session);
            }
            RouteOutcome::Refuse => self.context_manager.clear_pending(session),
        }

        Ok((response, sid))
    }

    /// Create an empty session and return its ID.
    pub fn create_session(&self) -> Result<Uuid, ChatError> {
        let session = self.context_manager.create_session();
        let sid = session.id;
        self.lock_sessions()?.insert(sid, session);
        Ok(sid)
    }

    /// Get a session by ID.
    pub fn get_session(&self, session_id: Uuid) -> Option<Session> {
        self.sessions
            .lock()
            .ok()
            .and_then(|s| s.get(&session_id).cloned())
    }

    /// List all active sessions as summaries.
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let sessions = match self.sessions.lock() {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        sessions
            .values()
            .map(|s| SessionSummary {
                id: s.id,
                started_at: format_epoch(s.started_at),
                last_message_at: format_epoch(s.last_message_at),
                message_count: s.next_position,
                vehicle_model: s.vehicle_model().map(str::to_string),
            })
            .collect()
    }

    /// Delete a session by ID.
    pub fn delete_session(&self, session_id: Uuid) -> Result<(), ChatError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.remove(&session_id).is_some() {
            Ok(())
        } else {
            Err(ChatError::SessionNotFound(session_id))
        }
    }

    /// Get the transcript of a session, oldest first.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<Utterance>, ChatError> {
        let sessions = self.lock_sessions()?;
        sessions
            .get(&session_id)
            .map(|s| s.transcript.clone())
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    // -- Private helpers --

    async fn dispatch(&self, sid: Uuid, decision: &RoutingDecision) -> ChatResponse {
        let capability = decision.capability();
        match self.registry.dispatch(decision).await {
            Ok(HandlerOutput::Answer(answer)) => self.response_generator.manual_answer(answer),
            Ok(HandlerOutput::Places {
                category,
                address,
                points,
            }) => {
                tracing::info!(session_id = %sid, %category, count = points.len(), "Places found");
                self.response_generator.places(category, &address, &points)
            }
            Err(e) => {
                tracing::warn!(session_id = %sid, %capability, error = %e, "Collaborator call failed");
                self.response_generator.failure(capability, &e)
            }
        }
    }

    /// Find the requested session, or start a new one when it is unknown or
    /// expired. Returns a snapshot of the session.
    fn resolve_session(&self, requested: Option<Uuid>) -> Result<Session, ChatError> {
        let mut sessions = self.lock_sessions()?;

        if let Some(sid) = requested {
            if let Some(session) = sessions.get(&sid) {
                if !self.context_manager.is_expired(session) {
                    return Ok(session.clone());
                }
                tracing::debug!(session_id = %sid, "Session expired");
                sessions.remove(&sid);
            }
        }

        let session = self.context_manager.create_session();
        sessions.insert(session.id, session.clone());
        tracing::debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<Uuid, Session>>, ChatError> {
        self.sessions
            .lock()
            .map_err(|e| ChatError::State(format!("session lock poisoned: {}", e)))
    }
}

/// Format epoch seconds as ISO 8601 string.
fn format_epoch(epoch: i64) -> String {
    chrono::Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

// =============================================================================
// Tests
// =============================================================================

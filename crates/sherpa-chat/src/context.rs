//! Conversation context management.
//!
//! Creates and expires sessions, appends to their transcripts and keeps the
//! session state the router reads from.

use std::collections::HashMap;

use chrono::Local;
use uuid::Uuid;

use crate::error::ChatError;
use crate::types::{
    PendingRequest, Role, Session, Utterance, STATE_EV_MODEL, STATE_PENDING_REQUEST,
};

// =============================================================================
// ConversationManager
// =============================================================================

/// Manages conversation sessions and their transcripts.
pub struct ConversationManager {
    /// Session timeout in minutes.
    pub session_timeout_minutes: u32,
    /// Maximum number of utterances kept per transcript.
    pub transcript_limit: usize,
    /// Vehicle model seeded into new sessions.
    pub initial_vehicle_model: Option<String>,
}

impl ConversationManager {
    pub fn new(
        session_timeout_minutes: u32,
        transcript_limit: usize,
        initial_vehicle_model: Option<String>,
    ) -> Self {
        Self {
            session_timeout_minutes,
            transcript_limit,
            initial_vehicle_model,
        }
    }

    /// Create a fresh conversation session.
    pub fn create_session(&self) -> Session {
        let now = Local::now().timestamp();
        let mut session = Session {
            id: Uuid::new_v4(),
            state: HashMap::new(),
            transcript: Vec::new(),
            next_position: 0,
            started_at: now,
            last_message_at: now,
        };
        if let Some(model) = &self.initial_vehicle_model {
            self.remember_model(&mut session, model);
        }
        session
    }

    /// Check whether a session has expired based on the configured timeout.
    pub fn is_expired(&self, session: &Session) -> bool {
        let now = Local::now().timestamp();
        let timeout_secs = i64::from(self.session_timeout_minutes) * 60;
        now - session.last_message_at > timeout_secs
    }

    /// Append an utterance to the transcript.
    ///
    /// Positions keep counting when the oldest entries fall out of the
    /// window, so an utterance's position never changes.
    pub fn append(&self, session: &mut Session, role: Role, text: &str) -> Utterance {
        let now = Local::now().timestamp();
        let utterance = Utterance {
            role,
            text: text.to_string(),
            position: session.next_position,
            created_at: now,
        };
        session.next_position += 1;
        session.last_message_at = now;
        session.transcript.push(utterance.clone());

        if self.transcript_limit > 0 && session.transcript.len() > self.transcript_limit {
            let excess = session.transcript.len() - self.transcript_limit;
            session.transcript.drain(..excess);
        }
        utterance
    }

    /// Remember the user's vehicle model for later turns.
    pub fn remember_model(&self, session: &mut Session, model: &str) {
        let model = model.trim();
        if model.is_empty() {
            return;
        }
        session.state.insert(
            STATE_EV_MODEL.to_string(),
            serde_json::Value::String(model.to_string()),
        );
    }

    /// Store the request waiting on a clarifying answer.
    pub fn set_pending(
        &self,
        session: &mut Session,
        pending: &PendingRequest,
    ) -> Result<(), ChatError> {
        let value = serde_json::to_value(pending)
            .map_err(|e| ChatError::State(format!("failed to store pending request: {e}")))?;
        session
            .state
            .insert(STATE_PENDING_REQUEST.to_string(), value);
        Ok(())
    }

    pub fn clear_pending(&self, session: &mut Session) {
        session.state.remove(STATE_PENDING_REQUEST);
    }
}

// =============================================================================
// Tests
// =============================================================================

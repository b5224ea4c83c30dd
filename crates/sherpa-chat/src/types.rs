//! Conversation types: transcripts, sessions, routing outcomes and replies.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sherpa_core::types::{Capability, PlaceCategory};
use uuid::Uuid;

/// Session state key holding the remembered vehicle model.
pub const STATE_EV_MODEL: &str = "ev_model";
/// Session state key holding the request awaiting an argument.
pub const STATE_PENDING_REQUEST: &str = "pending_request";

// =============================================================================
// Transcript
// =============================================================================

/// Speaker of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a session transcript. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    pub text: String,
    /// 0-based position in the session, counting entries already trimmed.
    pub position: usize,
    /// Epoch seconds.
    pub created_at: i64,
}

// =============================================================================
// Session
// =============================================================================

/// A conversation with one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Free-form key-value state such as `ev_model` and `pending_request`.
    pub state: HashMap<String, serde_json::Value>,
    /// Append-only transcript, oldest first.
    pub transcript: Vec<Utterance>,
    /// Position the next utterance will take.
    pub next_position: usize,
    pub started_at: i64,
    pub last_message_at: i64,
}

impl Session {
    /// The vehicle model remembered for this session.
    pub fn vehicle_model(&self) -> Option<&str> {
        self.state
            .get(STATE_EV_MODEL)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// The request waiting on a clarifying answer, if any.
    ///
    /// A state value that no longer decodes is treated as absent.
    pub fn pending_request(&self) -> Option<PendingRequest> {
        let value = self.state.get(STATE_PENDING_REQUEST)?;
        match serde_json::from_value(value.clone()) {
            Ok(pending) => Some(pending),
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "Discarding unreadable pending request");
                None
            }
        }
    }
}

/// Summary of a session for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub started_at: String,
    pub last_message_at: String,
    pub message_count: usize,
    pub vehicle_model: Option<String>,
}

// =============================================================================
// Routing
// =============================================================================

/// An argument a capability needs before it can be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Argument {
    /// Vehicle make and model, e.g. "Kia EV6".
    Model,
    /// Free-text description of the problem.
    Problem,
    /// Address to search around.
    Address,
}

impl Argument {
    /// Question asked when the argument is missing.
    pub fn question(self) -> &'static str {
        match self {
            Argument::Model => {
                "What is the make and model of your car (for example, 'Kia EV6')?"
            }
            Argument::Problem => "What would you like to know about your car?",
            Argument::Address => "What address should I search near?",
        }
    }
}

/// A capability with the arguments known so far.
///
/// Stored in session state while the router waits for a missing argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub capability: Capability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl PendingRequest {
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            model: None,
            problem: None,
            address: None,
        }
    }

    pub fn get(&self, argument: Argument) -> Option<&str> {
        let value = match argument {
            Argument::Model => &self.model,
            Argument::Problem => &self.problem,
            Argument::Address => &self.address,
        };
        value.as_deref().filter(|v| !v.trim().is_empty())
    }

    pub fn set(&mut self, argument: Argument, value: String) {
        let slot = match argument {
            Argument::Model => &mut self.model,
            Argument::Problem => &mut self.problem,
            Argument::Address => &mut self.address,
        };
        *slot = Some(value);
    }

    /// Arguments from `required` that are not filled yet, in order.
    pub fn missing(&self, required: &[Argument]) -> Vec<Argument> {
        required
            .iter()
            .copied()
            .filter(|arg| self.get(*arg).is_none())
            .collect()
    }

    /// Convert into a dispatchable decision. `None` while anything the
    /// capability needs is still missing.
    pub fn to_decision(&self) -> Option<RoutingDecision> {
        match self.capability.place_category() {
            None => Some(RoutingDecision::Manual {
                model: self.get(Argument::Model)?.to_string(),
                problem: self.get(Argument::Problem)?.to_string(),
            }),
            Some(category) => Some(RoutingDecision::Places {
                category,
                address: self.get(Argument::Address)?.to_string(),
            }),
        }
    }
}

/// A fully resolved request, valid for a single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "capability", rename_all = "snake_case")]
pub enum RoutingDecision {
    Manual { model: String, problem: String },
    Places { category: PlaceCategory, address: String },
}

impl RoutingDecision {
    pub fn capability(&self) -> Capability {
        match self {
            RoutingDecision::Manual { .. } => Capability::Manual,
            RoutingDecision::Places { category, .. } => category.capability(),
        }
    }
}

/// What the router decided to do with an utterance.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// Arguments are missing; ask for them and remember the request.
    Clarify {
        pending: PendingRequest,
        questions: Vec<&'static str>,
    },
    /// Everything is known; call the collaborator.
    Dispatch(RoutingDecision),
    /// The utterance matches none of the capabilities.
    Refuse,
}

// =============================================================================
// Replies
// =============================================================================

/// Kind of reply produced for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Manual answer text.
    Answer,
    /// A list of places.
    Places,
    /// A places lookup that found nothing.
    NoResults,
    /// Clarifying questions.
    Clarification,
    /// The fixed refusal.
    Refusal,
    /// A collaborator failed.
    Error,
}

/// The assistant's reply to one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub kind: ReplyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<Capability>,
}

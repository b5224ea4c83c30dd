//! Conversational core of the EV assistant.
//!
//! Classifies each utterance into one of the assistant's capabilities,
//! asks for missing arguments, dispatches resolved requests to the manual
//! and places collaborators, and keeps per-session transcripts.

pub mod context;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod parser;
pub mod response;
pub mod router;
pub mod types;

#[cfg(test)]
mod testing;

pub use context::ConversationManager;
pub use error::ChatError;
pub use handler::{CapabilityHandler, HandlerOutput, HandlerRegistry, ManualHandler, PlacesHandler};
pub use orchestrator::ChatOrchestrator;
pub use parser::{IntentParser, Make};
pub use response::{ResponseGenerator, REFUSAL_MESSAGE};
pub use router::{CapabilityRouter, RouteEntry, Routing, ROUTING_TABLE};
pub use types::{
    Argument, ChatResponse, PendingRequest, ReplyKind, Role, RouteOutcome, RoutingDecision,
    Session, SessionSummary, Utterance,
};

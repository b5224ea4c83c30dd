//! Reply rendering.
//!
//! Turns collaborator results, clarifying questions and failures into the
//! text shown to the user.

use std::fmt::Write as _;

use sherpa_core::types::{Capability, PlaceCategory, PointOfInterest};

use crate::error::ChatError;
use crate::types::{ChatResponse, ReplyKind};

/// Reply to anything outside the assistant's capabilities.
pub const REFUSAL_MESSAGE: &str = "Sorry, I can't help with that. I can answer questions about \
your EV from its owner's manual, or find the nearest charging stations and Hyundai or Kia \
service centres.";

// =============================================================================
// ResponseGenerator
// =============================================================================

/// Renders replies.
pub struct ResponseGenerator {
    /// Maximum number of places listed in a reply.
    pub max_results: usize,
    /// Search radius quoted when nothing is found, in metres.
    pub radius_m: u32,
}

impl ResponseGenerator {
    pub fn new(max_results: usize, radius_m: u32) -> Self {
        Self {
            max_results: max_results.max(1),
            radius_m,
        }
    }

    /// The manual answer, passed through unchanged.
    pub fn manual_answer(&self, answer: String) -> ChatResponse {
        ChatResponse {
            reply: answer,
            kind: ReplyKind::Answer,
            capability: Some(Capability::Manual),
        }
    }

    /// A numbered list of places in the order the lookup returned them.
    pub fn places(
        &self,
        category: PlaceCategory,
        address: &str,
        points: &[PointOfInterest],
    ) -> ChatResponse {
        if points.is_empty() {
            return self.no_places(category, address);
        }

        let shown = &points[..points.len().min(self.max_results)];
        let mut reply = format!(
            "Here are the nearest {} to {}:",
            category.plural_noun(),
            address
        );
        for (i, poi) in shown.iter().enumerate() {
            let _ = write!(reply, "\n{}. {}", i + 1, poi.name);
            if !poi.address.is_empty() {
                let _ = write!(reply, ", {}", poi.address);
            }
            let _ = write!(reply, " ({})", poi.coordinates);
        }
        let hidden = points.len() - shown.len();
        if hidden > 0 {
            let _ = write!(reply, "\n...and {hidden} more.");
        }

        ChatResponse {
            reply,
            kind: ReplyKind::Places,
            capability: Some(category.capability()),
        }
    }

    fn no_places(&self, category: PlaceCategory, address: &str) -> ChatResponse {
        ChatResponse {
            reply: format!(
                "Sorry, I couldn't find any {} within {} of {}. Try a more specific address.",
                category.plural_noun(),
                format_distance(self.radius_m),
                address
            ),
            kind: ReplyKind::NoResults,
            capability: Some(category.capability()),
        }
    }

    /// All clarifying questions batched into one reply.
    pub fn clarification(&self, capability: Capability, questions: &[&str]) -> ChatResponse {
        ChatResponse {
            reply: questions.join(" "),
            kind: ReplyKind::Clarification,
            capability: Some(capability),
        }
    }

    pub fn refusal(&self) -> ChatResponse {
        ChatResponse {
            reply: REFUSAL_MESSAGE.to_string(),
            kind: ReplyKind::Refusal,
            capability: None,
        }
    }

    /// Short diagnostic naming the capability that failed.
    pub fn failure(&self, capability: Capability, err: &ChatError) -> ChatResponse {
        let cause = match err {
            ChatError::Manual(e) => e.to_string(),
            ChatError::Places(e) => e.to_string(),
            other => other.to_string(),
        };
        ChatResponse {
            reply: format!(
                "Sorry, the {} failed: {}. Please try again later.",
                capability.label(),
                cause
            ),
            kind: ReplyKind::Error,
            capability: Some(capability),
        }
    }
}

fn format_distance(metres: u32) -> String {
    if metres >= 1000 && metres % 100 == 0 {
        let km = f64::from(metres) / 1000.0;
        if metres % 1000 == 0 {
            format!("{km:.0} km")
        } else {
            format!("{km:.1} km")
        }
    } else {
        format!("{metres} m")
    }
}

// =============================================================================
// Tests
// =============================================================================

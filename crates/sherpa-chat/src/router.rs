//! Capability routing.
//!
//! Picks the capability an utterance asks for, collects its arguments from
//! the utterance, the session and earlier answers, and decides whether the
//! request can be dispatched or needs a clarifying question first.

use sherpa_core::types::Capability;

use crate::parser::IntentParser;
use crate::types::{Argument, PendingRequest, Role, RouteOutcome, Session};

// =============================================================================
// Routing table
// =============================================================================

/// One row of the routing table: a capability and the arguments it needs.
#[derive(Debug, Clone, Copy)]
pub struct RouteEntry {
    pub capability: Capability,
    pub required: &'static [Argument],
}

/// Capabilities in priority order. The first one that matches wins.
pub const ROUTING_TABLE: [RouteEntry; 4] = [
    RouteEntry {
        capability: Capability::Manual,
        required: &[Argument::Model, Argument::Problem],
    },
    RouteEntry {
        capability: Capability::Charger,
        required: &[Argument::Address],
    },
    RouteEntry {
        capability: Capability::HyundaiService,
        required: &[Argument::Address],
    },
    RouteEntry {
        capability: Capability::KiaService,
        required: &[Argument::Address],
    },
];

/// Arguments `capability` needs before dispatch.
pub fn required_arguments(capability: Capability) -> &'static [Argument] {
    ROUTING_TABLE
        .iter()
        .find(|entry| entry.capability == capability)
        .map(|entry| entry.required)
        .unwrap_or(&[])
}

// =============================================================================
// CapabilityRouter
// =============================================================================

/// Result of routing one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Routing {
    pub outcome: RouteOutcome,
    /// Vehicle model the user supplied on this turn, to be remembered.
    pub vehicle_model: Option<String>,
}

/// Deterministic router from utterances to capabilities.
#[derive(Debug, Default, Clone)]
pub struct CapabilityRouter {
    parser: IntentParser,
}

impl CapabilityRouter {
    pub fn new() -> Self {
        Self {
            parser: IntentParser::new(),
        }
    }

    /// The highest-priority capability `text` asks for.
    pub fn classify(&self, text: &str, remembered_model: Option<&str>) -> Option<Capability> {
        ROUTING_TABLE
            .iter()
            .map(|entry| entry.capability)
            .find(|cap| self.parser.matches(*cap, text, remembered_model))
    }

    /// Route `utterance` in the context of `session`.
    ///
    /// An utterance that asks for a capability starts a new request and
    /// replaces any pending one. Otherwise, if a request is pending, the
    /// utterance is read as the answer to its outstanding question.
    pub fn route(&self, utterance: &str, session: &Session) -> Routing {
        let text = utterance.trim();
        let mentioned = self.parser.extract_model(text).map(str::to_string);
        let known_model = mentioned
            .clone()
            .or_else(|| self.remembered_model(session));

        if let Some(capability) = self.classify(text, known_model.as_deref()) {
            let mut request = PendingRequest::new(capability);
            if capability == Capability::Manual {
                request.model = known_model;
                request.problem = Some(text.to_string());
            } else {
                request.address = self.parser.extract_address(text);
            }
            tracing::debug!(%capability, "Utterance classified");
            return Routing {
                outcome: resolve(request),
                vehicle_model: mentioned,
            };
        }

        if let Some(mut pending) = session.pending_request() {
            let capability = pending.capability;
            match self.apply_answer(&mut pending, text) {
                Answer::Filled(argument) => {
                    tracing::debug!(%capability, ?argument, "Utterance read as clarification answer");
                    let answered_model = match argument {
                        Argument::Model => pending.model.clone(),
                        _ => None,
                    };
                    return Routing {
                        outcome: resolve(pending),
                        vehicle_model: answered_model.or(mentioned),
                    };
                }
                Answer::Vague => {
                    tracing::debug!(%capability, "Clarification answer too vague, asking again");
                    return Routing {
                        outcome: resolve(pending),
                        vehicle_model: mentioned,
                    };
                }
                Answer::Rejected => {
                    tracing::debug!(%capability, "Utterance does not answer the pending question");
                }
            }
        }

        tracing::debug!("Utterance matches no capability");
        Routing {
            outcome: RouteOutcome::Refuse,
            vehicle_model: mentioned,
        }
    }

    /// Fill the first missing argument of `pending` from `answer`.
    fn apply_answer(&self, pending: &mut PendingRequest, answer: &str) -> Answer {
        let required = required_arguments(pending.capability);
        let Some(next) = pending.missing(required).into_iter().next() else {
            return Answer::Rejected;
        };
        let value = match next {
            Argument::Model => self.parser.model_answer(answer),
            Argument::Address => self.parser.address_answer(answer),
            Argument::Problem => Some(answer.to_string()).filter(|a| !a.is_empty()),
        };
        match value {
            Some(value) => {
                pending.set(next, value);
                Answer::Filled(next)
            }
            None if next == Argument::Address && self.parser.is_vague_location(answer) => {
                Answer::Vague
            }
            None => Answer::Rejected,
        }
    }

    /// Model from session state, else the latest one the user mentioned.
    fn remembered_model(&self, session: &Session) -> Option<String> {
        if let Some(model) = session.vehicle_model() {
            return Some(model.to_string());
        }
        session
            .transcript
            .iter()
            .rev()
            .filter(|u| u.role == Role::User)
            .find_map(|u| self.parser.extract_model(&u.text))
            .map(str::to_string)
    }
}

/// How a reply to a clarifying question was read.
enum Answer {
    Filled(Argument),
    /// A location too vague to search near; the question stands.
    Vague,
    /// Not an answer to the question at all.
    Rejected,
}

fn resolve(request: PendingRequest) -> RouteOutcome {
    let missing = request.missing(required_arguments(request.capability));
    match request.to_decision() {
        Some(decision) if missing.is_empty() => RouteOutcome::Dispatch(decision),
        _ => RouteOutcome::Clarify {
            questions: missing.iter().map(|arg| arg.question()).collect(),
            pending: request,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoutingDecision, Utterance, STATE_EV_MODEL, STATE_PENDING_REQUEST};
    use sherpa_core::types::PlaceCategory;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            id: Uuid::new_v4(),
            state: HashMap::new(),
            transcript: Vec::new(),
            next_position: 0,
            started_at: 0,
            last_message_at: 0,
        }
    }

    fn session_with_model(model: &str) -> Session {
        let mut s = session();
        s.state
            .insert(STATE_EV_MODEL.to_string(), serde_json::json!(model));
        s
    }

    fn session_with_pending(pending: &PendingRequest) -> Session {
        let mut s = session();
        s.state.insert(
            STATE_PENDING_REQUEST.to_string(),
            serde_json::to_value(pending).unwrap(),
        );
        s
    }

    fn router() -> CapabilityRouter {
        CapabilityRouter::new()
    }

    // ---- Routing table ----

    #[test]
    fn test_routing_table_follows_priority() {
        let order: Vec<Capability> = ROUTING_TABLE.iter().map(|e| e.capability).collect();
        assert_eq!(order, Capability::PRIORITY.to_vec());
    }

    #[test]
    fn test_required_arguments_schema() {
        assert_eq!(
            required_arguments(Capability::Manual),
            &[Argument::Model, Argument::Problem]
        );
        for category in PlaceCategory::ALL {
            assert_eq!(
                required_arguments(category.capability()),
                &[Argument::Address]
            );
        }
    }

    // ---- Manual ----

    #[test]
    fn test_manual_with_known_model_dispatches() {
        let routing = router().route("battery won't charge", &session_with_model("Kia EV6"));
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Manual {
                model: "Kia EV6".to_string(),
                problem: "battery won't charge".to_string(),
            })
        );
    }

    #[test]
    fn test_manual_model_in_utterance() {
        let routing = router().route("My kia ev6 makes a grinding noise when braking", &session());
        match routing.outcome {
            RouteOutcome::Dispatch(RoutingDecision::Manual { model, problem }) => {
                assert_eq!(model, "Kia EV6");
                assert_eq!(problem, "My kia ev6 makes a grinding noise when braking");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(routing.vehicle_model.as_deref(), Some("Kia EV6"));
    }

    #[test]
    fn test_manual_without_model_asks_for_it() {
        let routing = router().route("my battery keeps draining overnight", &session());
        match routing.outcome {
            RouteOutcome::Clarify { pending, questions } => {
                assert_eq!(pending.capability, Capability::Manual);
                assert_eq!(pending.problem.as_deref(), Some("my battery keeps draining overnight"));
                assert_eq!(questions, vec![Argument::Model.question()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_manual_model_from_transcript() {
        let mut s = session();
        s.transcript.push(Utterance {
            role: Role::User,
            text: "I drive an Ioniq 6".to_string(),
            position: 0,
            created_at: 0,
        });
        let routing = router().route("how do I turn on the heat pump?", &s);
        assert!(matches!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Manual { ref model, .. }) if model == "Hyundai Ioniq 6"
        ));
    }

    // ---- Places ----

    #[test]
    fn test_places_without_address_asks_for_one() {
        for text in [
            "Find the nearest charging stations",
            "nearest Hyundai service centre",
            "where is the closest Kia dealer near me?",
        ] {
            match router().route(text, &session()).outcome {
                RouteOutcome::Clarify { questions, pending } => {
                    assert_eq!(questions, vec![Argument::Address.question()], "{text}");
                    assert!(pending.address.is_none());
                }
                other => panic!("{text}: unexpected outcome {other:?}"),
            }
        }
    }

    #[test]
    fn test_places_with_address_dispatches() {
        let routing = router().route(
            "Find charging stations near 1 Raffles Place, Singapore",
            &session(),
        );
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Places {
                category: PlaceCategory::Charger,
                address: "1 Raffles Place, Singapore".to_string(),
            })
        );
    }

    #[test]
    fn test_place_request_never_routes_to_manual() {
        let routing = router().route(
            "My Ioniq 5 battery is nearly flat, where is the nearest charger near Oslo?",
            &session(),
        );
        assert!(matches!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Places {
                category: PlaceCategory::Charger,
                ..
            })
        ));
    }

    #[test]
    fn test_service_request_uses_remembered_make() {
        let routing = router().route(
            "nearest service centre to 5 Main St",
            &session_with_model("Kia Niro Electric"),
        );
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Places {
                category: PlaceCategory::KiaService,
                address: "5 Main St".to_string(),
            })
        );
    }

    #[test]
    fn test_service_request_without_any_make_is_refused() {
        let routing = router().route("nearest service centre to 5 Main St", &session());
        assert_eq!(routing.outcome, RouteOutcome::Refuse);
    }

    // ---- Refusal ----

    #[test]
    fn test_unrelated_utterance_is_refused() {
        assert_eq!(router().route("What's the weather?", &session()).outcome, RouteOutcome::Refuse);
        assert_eq!(router().route("tell me a joke", &session()).outcome, RouteOutcome::Refuse);
    }

    // ---- Pending requests ----

    #[test]
    fn test_pending_address_completed_by_next_turn() {
        let pending = PendingRequest::new(Capability::HyundaiService);
        let routing = router().route("12 Teheran-ro, Seoul", &session_with_pending(&pending));
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Places {
                category: PlaceCategory::HyundaiService,
                address: "12 Teheran-ro, Seoul".to_string(),
            })
        );
    }

    #[test]
    fn test_pending_model_completed_by_next_turn() {
        let mut pending = PendingRequest::new(Capability::Manual);
        pending.problem = Some("battery won't charge".to_string());
        let routing = router().route("Kia EV6", &session_with_pending(&pending));
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Manual {
                model: "Kia EV6".to_string(),
                problem: "battery won't charge".to_string(),
            })
        );
        assert_eq!(routing.vehicle_model.as_deref(), Some("Kia EV6"));
    }

    #[test]
    fn test_vague_answer_keeps_asking() {
        let pending = PendingRequest::new(Capability::Charger);
        match router().route("here", &session_with_pending(&pending)).outcome {
            RouteOutcome::Clarify { pending: still, questions } => {
                assert_eq!(still, pending);
                assert_eq!(questions, vec![Argument::Address.question()]);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_off_topic_reply_to_address_question_is_refused() {
        let pending = PendingRequest::new(Capability::Charger);
        for reply in ["What's the weather?", "tell me a joke", "in the morning"] {
            let routing = router().route(reply, &session_with_pending(&pending));
            assert_eq!(routing.outcome, RouteOutcome::Refuse, "{reply}");
        }
    }

    #[test]
    fn test_off_topic_reply_to_model_question_is_refused() {
        let mut pending = PendingRequest::new(Capability::Manual);
        pending.problem = Some("battery won't charge".to_string());
        let routing = router().route("What's the weather?", &session_with_pending(&pending));
        assert_eq!(routing.outcome, RouteOutcome::Refuse);
        assert_eq!(routing.vehicle_model, None);

        let routing = router().route("a Tesla Model 3", &session_with_pending(&pending));
        assert_eq!(routing.outcome, RouteOutcome::Refuse);
    }

    #[test]
    fn test_new_capability_replaces_pending() {
        let pending = PendingRequest::new(Capability::Charger);
        let routing = router().route(
            "actually, the nearest Kia dealer in Busan",
            &session_with_pending(&pending),
        );
        assert_eq!(
            routing.outcome,
            RouteOutcome::Dispatch(RoutingDecision::Places {
                category: PlaceCategory::KiaService,
                address: "Busan".to_string(),
            })
        );
    }
}

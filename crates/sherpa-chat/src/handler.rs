//! Capability handlers and the registry that dispatches to them.
//!
//! Each handler wraps one collaborator call. The registry maps a resolved
//! [`RoutingDecision`] to the handler registered for its capability.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sherpa_core::types::{Capability, PlaceCategory, PointOfInterest};
use sherpa_manual::ManualAnswerer;
use sherpa_places::PlacesLookup;

use crate::error::ChatError;
use crate::router::required_arguments;
use crate::types::{Argument, RoutingDecision};

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerOutput {
    /// Answer text from the manual lookup.
    Answer(String),
    /// Places nearest-first, as returned by the lookup.
    Places {
        category: PlaceCategory,
        address: String,
        points: Vec<PointOfInterest>,
    },
}

/// Executes one capability.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    fn capability(&self) -> Capability;

    /// Arguments the decision must carry. Defaults to the routing table.
    fn required_arguments(&self) -> &'static [Argument] {
        required_arguments(self.capability())
    }

    async fn handle(&self, decision: &RoutingDecision) -> Result<HandlerOutput, ChatError>;
}

// =============================================================================
// Handlers
// =============================================================================

/// Answers vehicle questions from the owner's manuals.
pub struct ManualHandler {
    answerer: Arc<dyn ManualAnswerer>,
}

impl ManualHandler {
    pub fn new(answerer: Arc<dyn ManualAnswerer>) -> Self {
        Self { answerer }
    }
}

#[async_trait]
impl CapabilityHandler for ManualHandler {
    fn capability(&self) -> Capability {
        Capability::Manual
    }

    async fn handle(&self, decision: &RoutingDecision) -> Result<HandlerOutput, ChatError> {
        let RoutingDecision::Manual { model, problem } = decision else {
            return Err(ChatError::NoHandler(decision.capability()));
        };
        let answer = self.answerer.answer(model, problem).await?;
        Ok(HandlerOutput::Answer(answer))
    }
}

/// Finds the nearest places of one category.
pub struct PlacesHandler {
    category: PlaceCategory,
    lookup: Arc<dyn PlacesLookup>,
}

impl PlacesHandler {
    pub fn new(category: PlaceCategory, lookup: Arc<dyn PlacesLookup>) -> Self {
        Self { category, lookup }
    }
}

#[async_trait]
impl CapabilityHandler for PlacesHandler {
    fn capability(&self) -> Capability {
        self.category.capability()
    }

    async fn handle(&self, decision: &RoutingDecision) -> Result<HandlerOutput, ChatError> {
        match decision {
            RoutingDecision::Places { category, address } if *category == self.category => {
                let points = self.lookup.nearest(address, self.category).await?;
                Ok(HandlerOutput::Places {
                    category: self.category,
                    address: address.clone(),
                    points,
                })
            }
            other => Err(ChatError::NoHandler(other.capability())),
        }
    }
}

// =============================================================================
// HandlerRegistry
// =============================================================================

/// Routing table from capability to handler.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<Capability, Arc<dyn CapabilityHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with a handler for every capability.
    pub fn with_collaborators(
        answerer: Arc<dyn ManualAnswerer>,
        lookup: Arc<dyn PlacesLookup>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ManualHandler::new(answerer)));
        for category in PlaceCategory::ALL {
            registry.register(Arc::new(PlacesHandler::new(category, Arc::clone(&lookup))));
        }
        registry
    }

    /// Register a handler, replacing any existing one for its capability.
    pub fn register(&mut self, handler: Arc<dyn CapabilityHandler>) {
        self.handlers.insert(handler.capability(), handler);
    }

    pub fn get(&self, capability: Capability) -> Option<&Arc<dyn CapabilityHandler>> {
        self.handlers.get(&capability)
    }

    pub fn capabilities(&self) -> Vec<Capability> {
        Capability::PRIORITY
            .into_iter()
            .filter(|cap| self.handlers.contains_key(cap))
            .collect()
    }

    /// Run the handler for `decision`.
    pub async fn dispatch(&self, decision: &RoutingDecision) -> Result<HandlerOutput, ChatError> {
        let capability = decision.capability();
        let handler = self
            .get(capability)
            .ok_or(ChatError::NoHandler(capability))?;

        tracing::info!(%capability, "Dispatching to collaborator");
        handler.handle(decision).await
    }
}

// =============================================================================
// Tests
// =============================================================================

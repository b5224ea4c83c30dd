//! Vehicle manual question answering.
//!
//! Answers free-text problem descriptions from a retrieval corpus built from
//! the owner's manuals of the supported Hyundai and Kia electric models.

pub mod error;
pub mod vertex_rag;

use async_trait::async_trait;

pub use error::ManualError;
pub use vertex_rag::VertexRagAnswerer;

/// Models whose manuals are in the corpus.
pub const SUPPORTED_MODELS: &[&str] = &[
    "Hyundai Kona Electric",
    "Hyundai Ioniq",
    "Hyundai Ioniq 5",
    "Hyundai Ioniq 6",
    "Kia Niro Electric",
    "Kia EV6",
];

/// Manual lookup collaborator.
#[async_trait]
pub trait ManualAnswerer: Send + Sync {
    /// Answer `problem` for the given make and model.
    async fn answer(&self, model: &str, problem: &str) -> Result<String, ManualError>;
}

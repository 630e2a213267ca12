//! Collaborator seams of the matching engine.
//!
//! The engine only talks to retrieval, enrichment and evaluation through
//! these traits, so backends can be swapped and faked in tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::filters::SearchFilters;
use crate::models::{Enrichment, ProgramCandidate, Qualification, StructuredRequirements, UserProfile};

/// Errors surfaced by candidate retrieval
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Retrieval backend unavailable: {0}")]
    Unavailable(String),
}

/// Nearest-neighbour search over the program catalogue
///
/// Implementations return at most `limit` candidates ordered by ascending
/// distance and apply no tier logic. Zero candidates is a valid answer.
#[async_trait]
pub trait CandidateRetriever: Send + Sync {
    async fn retrieve(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<ProgramCandidate>, RetrievalError>;
}

/// Turns a program's raw text into structured requirements
///
/// Must not fail: internal problems are logged and reported as
/// [`Enrichment::Defaulted`].
#[async_trait]
pub trait RequirementEnricher: Send + Sync {
    async fn enrich(&self, candidate: &ProgramCandidate) -> Enrichment;
}

/// Judges a profile against one program's requirements
///
/// Always yields a verdict for every category.
#[async_trait]
pub trait QualificationEvaluator: Send + Sync {
    async fn evaluate(&self, profile: &UserProfile, requirements: &StructuredRequirements) -> Qualification;

    /// Short backend name for logs
    fn name(&self) -> &'static str;
}

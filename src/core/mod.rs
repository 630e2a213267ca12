// Core engine exports
pub mod assembler;
pub mod filters;
pub mod matcher;
pub mod parsing;
pub mod qualification;
pub mod scoring;
pub mod tiers;
pub mod traits;

pub use assembler::{assemble, AssemblyInput, ScoredCandidate};
pub use filters::SearchFilters;
pub use matcher::{MatchError, MatchOutcome, Matcher, RunSettings};
pub use qualification::{evaluate_rules, RuleBasedEvaluator};
pub use scoring::{normalize_score, Band, PolicyError, ScoreBands};
pub use tiers::{classify_tiers, TierAssignment, TierPolicy};
pub use traits::{CandidateRetriever, QualificationEvaluator, RequirementEnricher, RetrievalError};

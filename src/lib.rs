//! GradMatch - graduate program matching and tier classification
//!
//! Given a profile embedding, the engine retrieves nearest-neighbour programs,
//! partitions them into Dream, Target and Safe tiers with tier-bounded match
//! scores, and checks the applicant against each program's requirements.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{classify_tiers, MatchError, MatchOutcome, Matcher, RunSettings, ScoreBands, SearchFilters, TierPolicy};
pub use models::{ClassifiedProgram, ProgramCandidate, Qualification, QualificationStatus, Tier, TieredPrograms, UserProfile};

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    ClassifiedProgram, DefaultReason, Enrichment, ProgramCandidate, Qualification, QualificationStatus,
    RequirementCategory, RequirementsSource, StructuredRequirements, Tier, TieredPrograms, UserProfile, Verdict,
};
pub use requests::{ClassifyRequest, FilterParams, SnapshotQuery};
pub use responses::{ClassifyResponse, ErrorResponse, HealthResponse};

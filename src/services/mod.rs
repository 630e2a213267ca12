// Service exports
pub mod enrichment;
pub mod llm;
pub mod llm_evaluator;
pub mod postgres;

pub use enrichment::LlmRequirementEnricher;
pub use llm::{LlmClient, LlmConfig, LlmError};
pub use llm_evaluator::LlmQualificationEvaluator;
pub use postgres::{MatchSnapshot, PgProgramStore, StoreError};

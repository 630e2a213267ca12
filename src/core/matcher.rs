use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::assembler::{assemble, AssemblyInput, ScoredCandidate};
use crate::core::filters::SearchFilters;
use crate::core::qualification::evaluate_rules;
use crate::core::scoring::{normalize_score, PolicyError, ScoreBands};
use crate::core::tiers::{classify_tiers, TierPolicy};
use crate::core::traits::{CandidateRetriever, QualificationEvaluator, RequirementEnricher, RetrievalError};
use crate::models::{
    DefaultReason, Enrichment, ProgramCandidate, Qualification, StructuredRequirements, Tier, TieredPrograms,
    UserProfile,
};

/// Errors that abort a classification run
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Could not generate recommendations: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),
}

/// Per-run limits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub candidate_limit: usize,
    pub enrichment_concurrency: usize,
    /// Budget for a whole run, measured from the start of `classify`
    pub deadline: Option<Duration>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            candidate_limit: 50,
            enrichment_concurrency: 5,
            deadline: None,
        }
    }
}

/// Result of one classification run
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub run_id: Uuid,
    pub tiers: TieredPrograms,
    /// Candidates returned by retrieval, before tiering
    pub total_candidates: usize,
}

/// Main matching orchestrator
///
/// # Pipeline Stages
/// 1. Nearest-neighbour retrieval
/// 2. Tier classification
/// 3. Score normalization
/// 4. Requirement enrichment, fanned out with bounded concurrency
/// 5. Qualification evaluation
/// 6. Assembly into the three tier lists
///
/// Holds no per-run state; one `Matcher` serves concurrent runs.
#[derive(Clone)]
pub struct Matcher {
    policy: TierPolicy,
    bands: ScoreBands,
    settings: RunSettings,
    retriever: Arc<dyn CandidateRetriever>,
    enricher: Arc<dyn RequirementEnricher>,
    evaluator: Arc<dyn QualificationEvaluator>,
}

impl Matcher {
    pub fn new(
        policy: TierPolicy,
        bands: ScoreBands,
        settings: RunSettings,
        retriever: Arc<dyn CandidateRetriever>,
        enricher: Arc<dyn RequirementEnricher>,
        evaluator: Arc<dyn QualificationEvaluator>,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;
        bands.validate()?;
        if settings.enrichment_concurrency == 0 {
            return Err(PolicyError::ZeroConcurrency);
        }

        Ok(Self {
            policy,
            bands,
            settings,
            retriever,
            enricher,
            evaluator,
        })
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    pub fn bands(&self) -> &ScoreBands {
        &self.bands
    }

    pub fn evaluator_name(&self) -> &'static str {
        self.evaluator.name()
    }

    /// Classify programs for a profile using the configured run deadline
    pub async fn classify(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
        filters: &SearchFilters,
    ) -> Result<MatchOutcome, MatchError> {
        let deadline = self.settings.deadline.map(|budget| Instant::now() + budget);
        self.run(profile, embedding, filters, deadline).await
    }

    /// Classify programs, defaulting any enrichment still pending at `deadline`
    pub async fn classify_until(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
        filters: &SearchFilters,
        deadline: Instant,
    ) -> Result<MatchOutcome, MatchError> {
        self.run(profile, embedding, filters, Some(deadline)).await
    }

    async fn run(
        &self,
        profile: &UserProfile,
        embedding: &[f32],
        filters: &SearchFilters,
        deadline: Option<Instant>,
    ) -> Result<MatchOutcome, MatchError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("classify", %run_id, evaluator = self.evaluator.name());

        async move {
            check_embedding(embedding)?;

            let candidates = self
                .retriever
                .retrieve(embedding, filters, self.settings.candidate_limit)
                .await
                .map_err(|e| {
                    error!("Candidate retrieval failed: {}", e);
                    e
                })?;
            let total_candidates = candidates.len();
            info!(candidates = total_candidates, "Retrieved candidates");

            let assignment = classify_tiers(candidates, &self.policy);
            debug!(
                dream = assignment.dream.len(),
                target = assignment.target.len(),
                safe = assignment.safe.len(),
                discarded = assignment.discarded,
                duplicates = assignment.duplicates,
                "Tiers assigned"
            );

            let scored: Vec<ScoredCandidate> = [
                (Tier::Dream, assignment.dream),
                (Tier::Target, assignment.target),
                (Tier::Safe, assignment.safe),
            ]
            .into_iter()
            .flat_map(|(tier, members)| {
                members.into_iter().map(move |candidate| ScoredCandidate {
                    match_score: normalize_score(candidate.distance, tier, &self.bands),
                    candidate,
                    tier,
                })
            })
            .collect();

            // `buffered` keeps input order, so results line up with `scored`
            let enrichments: Vec<Enrichment> = stream::iter(
                scored.iter().map(|s| self.enrich_before(&s.candidate, deadline)),
            )
            .buffered(self.settings.enrichment_concurrency)
            .collect()
            .await;

            let requirements: Vec<StructuredRequirements> =
                enrichments.iter().map(Enrichment::requirements).collect();
            // Evaluation shares the enrichment bound
            let qualifications: Vec<Qualification> = stream::iter(
                requirements.iter().map(|r| self.evaluate_before(profile, r, deadline)),
            )
            .buffered(self.settings.enrichment_concurrency)
            .collect()
            .await;

            let inputs = scored
                .into_iter()
                .zip(enrichments)
                .zip(qualifications)
                .map(|((scored, enrichment), qualification)| AssemblyInput {
                    scored,
                    enrichment,
                    qualification,
                })
                .collect();

            let tiers = assemble(inputs, &self.bands);
            info!(
                dream = tiers.dream.len(),
                target = tiers.target.len(),
                safe = tiers.safe.len(),
                candidates = total_candidates,
                "Classification complete"
            );

            Ok(MatchOutcome {
                run_id,
                tiers,
                total_candidates,
            })
        }
        .instrument(span)
        .await
    }

    async fn enrich_before(&self, candidate: &ProgramCandidate, deadline: Option<Instant>) -> Enrichment {
        let enrichment = match deadline {
            Some(at) => timeout_at(at, self.enricher.enrich(candidate))
                .await
                .unwrap_or(Enrichment::Defaulted(DefaultReason::DeadlineExceeded)),
            None => self.enricher.enrich(candidate).await,
        };

        if let Enrichment::Defaulted(reason) = &enrichment {
            warn!(
                school = %candidate.school_name,
                program = %candidate.program_name,
                %reason,
                "Using default requirements"
            );
        }

        enrichment
    }

    async fn evaluate_before(
        &self,
        profile: &UserProfile,
        requirements: &StructuredRequirements,
        deadline: Option<Instant>,
    ) -> Qualification {
        match deadline {
            Some(at) => match timeout_at(at, self.evaluator.evaluate(profile, requirements)).await {
                Ok(qualification) => qualification,
                Err(_) => {
                    debug!("Evaluation passed the deadline, using rules");
                    evaluate_rules(profile, requirements)
                }
            },
            None => self.evaluator.evaluate(profile, requirements).await,
        }
    }
}

fn check_embedding(embedding: &[f32]) -> Result<(), MatchError> {
    if embedding.is_empty() {
        return Err(MatchError::InvalidEmbedding("embedding is empty".to_string()));
    }
    if let Some(idx) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(MatchError::InvalidEmbedding(format!("non-finite value at index {}", idx)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::core::qualification::RuleBasedEvaluator;

    struct FixedRetriever(Vec<ProgramCandidate>);

    #[async_trait]
    impl CandidateRetriever for FixedRetriever {
        async fn retrieve(
            &self,
            _embedding: &[f32],
            _filters: &SearchFilters,
            limit: usize,
        ) -> Result<Vec<ProgramCandidate>, RetrievalError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }
    }

    struct DefaultEnricher;

    #[async_trait]
    impl RequirementEnricher for DefaultEnricher {
        async fn enrich(&self, _candidate: &ProgramCandidate) -> Enrichment {
            Enrichment::Defaulted(DefaultReason::CallFailed)
        }
    }

    fn candidate(school: &str, ranking: u32, distance: f64) -> ProgramCandidate {
        ProgramCandidate {
            school_name: school.to_string(),
            program_name: "MSc Computer Science".to_string(),
            country: "United Kingdom".to_string(),
            ranking: Some(ranking),
            distance,
            degree_type: None,
            duration: None,
            program_details: String::new(),
            language_text: None,
        }
    }

    fn matcher(candidates: Vec<ProgramCandidate>, settings: RunSettings) -> Result<Matcher, PolicyError> {
        Matcher::new(
            TierPolicy::default(),
            ScoreBands::default(),
            settings,
            Arc::new(FixedRetriever(candidates)),
            Arc::new(DefaultEnricher),
            Arc::new(RuleBasedEvaluator),
        )
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let settings = RunSettings {
            enrichment_concurrency: 0,
            ..RunSettings::default()
        };
        assert!(matches!(matcher(vec![], settings), Err(PolicyError::ZeroConcurrency)));
    }

    #[test]
    fn test_check_embedding() {
        assert!(check_embedding(&[0.1, 0.2]).is_ok());
        assert!(matches!(check_embedding(&[]), Err(MatchError::InvalidEmbedding(_))));
        assert!(matches!(check_embedding(&[0.1, f32::NAN]), Err(MatchError::InvalidEmbedding(_))));
    }

    #[tokio::test]
    async fn test_classify_respects_candidate_limit() {
        let candidates = (0..20).map(|i| candidate(&format!("School {}", i), 100 + i, 0.1 + i as f64 * 0.01)).collect();
        let settings = RunSettings {
            candidate_limit: 5,
            ..RunSettings::default()
        };
        let matcher = matcher(candidates, settings).unwrap();

        let outcome = matcher
            .classify(&UserProfile::default(), &[0.1, 0.2], &SearchFilters::default())
            .await
            .unwrap();

        assert_eq!(outcome.total_candidates, 5);
        // ceil(5 * 0.3) = 2 safe, remaining 3 target
        assert_eq!(outcome.tiers.safe.len(), 2);
        assert_eq!(outcome.tiers.target.len(), 3);
        assert!(outcome.tiers.dream.is_empty());
    }
}

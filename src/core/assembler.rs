use std::collections::{BTreeSet, HashSet};
use crate::core::scoring::ScoreBands;
use crate::models::{ClassifiedProgram, Enrichment, ProgramCandidate, Qualification, Tier, TieredPrograms};

/// A tiered candidate with its normalized score, before enrichment
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub candidate: ProgramCandidate,
    pub tier: Tier,
    pub match_score: f64,
}

/// Everything the assembler needs for one program
#[derive(Debug, Clone)]
pub struct AssemblyInput {
    pub scored: ScoredCandidate,
    pub enrichment: Enrichment,
    pub qualification: Qualification,
}

/// Vocabulary terms the applicant lacks across all categories
pub fn collect_gaps(qualification: &Qualification) -> Vec<String> {
    qualification
        .entries()
        .iter()
        .flat_map(|(_, verdict)| verdict.missing.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Merge tier, score, requirements and verdicts into the three output lists
///
/// Pure data transformation. Input order within a tier is preserved; a
/// repeated (school, program) pair is dropped and every score is re-bounded
/// to its tier's band.
pub fn assemble(inputs: Vec<AssemblyInput>, bands: &ScoreBands) -> TieredPrograms {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(inputs.len());
    let mut out = TieredPrograms::default();

    for input in inputs {
        let AssemblyInput {
            scored,
            enrichment,
            qualification,
        } = input;

        if !seen.insert(scored.candidate.key()) {
            tracing::warn!(
                school = %scored.candidate.school_name,
                program = %scored.candidate.program_name,
                "Dropping repeated program during assembly"
            );
            continue;
        }

        let program = ClassifiedProgram {
            details_snippet: scored.candidate.details_snippet(),
            match_score: bands.for_tier(scored.tier).bound(scored.match_score),
            tier: scored.tier,
            requirements: enrichment.requirements(),
            requirements_source: enrichment.source(),
            gaps: collect_gaps(&qualification),
            qualification_status: qualification,
            candidate: scored.candidate,
        };

        match program.tier {
            Tier::Dream => out.dream.push(program),
            Tier::Target => out.target.push(program),
            Tier::Safe => out.safe.push(program),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::qualification::evaluate_rules;
    use crate::models::{DefaultReason, QualificationStatus, RequirementsSource, StructuredRequirements, UserProfile};

    fn candidate(school: &str) -> ProgramCandidate {
        ProgramCandidate {
            school_name: school.to_string(),
            program_name: "MS Data Science".to_string(),
            country: "United Kingdom".to_string(),
            ranking: Some(50),
            distance: 0.2,
            degree_type: None,
            duration: None,
            program_details: "x".repeat(300),
            language_text: None,
        }
    }

    fn input(school: &str, tier: Tier, score: f64, enrichment: Enrichment) -> AssemblyInput {
        let requirements = enrichment.requirements();
        AssemblyInput {
            scored: ScoredCandidate {
                candidate: candidate(school),
                tier,
                match_score: score,
            },
            enrichment,
            qualification: evaluate_rules(&UserProfile::default(), &requirements),
        }
    }

    fn requirements() -> StructuredRequirements {
        StructuredRequirements {
            tuition: "£30,000".to_string(),
            gpa_requirement: "3.3".to_string(),
            language_requirement: "IELTS 6.5".to_string(),
            prerequisite_courses: "Linear algebra and Python".to_string(),
            degree_requirement: "Bachelor's degree".to_string(),
            other_requirements: "Research experience".to_string(),
        }
    }

    #[test]
    fn test_assemble_routes_by_tier() {
        let inputs = vec![
            input("A", Tier::Dream, 60.0, Enrichment::Extracted(requirements())),
            input("B", Tier::Safe, 90.0, Enrichment::Extracted(requirements())),
            input("C", Tier::Target, 75.0, Enrichment::Defaulted(DefaultReason::CallFailed)),
        ];

        let result = assemble(inputs, &ScoreBands::default());
        assert_eq!(result.dream.len(), 1);
        assert_eq!(result.target.len(), 1);
        assert_eq!(result.safe.len(), 1);
        assert_eq!(result.target[0].requirements_source, RequirementsSource::Default);
        assert_eq!(result.target[0].requirements, StructuredRequirements::default());
        assert_eq!(result.dream[0].match_score, 60.0);
    }

    #[test]
    fn test_assemble_drops_repeats() {
        let inputs = vec![
            input("Same", Tier::Dream, 60.0, Enrichment::Extracted(requirements())),
            input("same", Tier::Safe, 90.0, Enrichment::Extracted(requirements())),
        ];

        let result = assemble(inputs, &ScoreBands::default());
        assert_eq!(result.len(), 1);
        assert_eq!(result.dream.len(), 1);
    }

    #[test]
    fn test_assemble_rebounds_scores() {
        let inputs = vec![input("A", Tier::Safe, 40.0, Enrichment::Extracted(requirements()))];
        let result = assemble(inputs, &ScoreBands::default());
        assert_eq!(result.safe[0].match_score, 85.0);
    }

    #[test]
    fn test_gaps_and_snippet() {
        let inputs = vec![input("A", Tier::Target, 75.0, Enrichment::Extracted(requirements()))];
        let result = assemble(inputs, &ScoreBands::default());
        let program = &result.target[0];

        assert_eq!(
            program.gaps,
            vec!["linear algebra".to_string(), "python".to_string(), "research".to_string()]
        );
        assert_eq!(program.qualification_status.prerequisites.status, QualificationStatus::NotMet);
        assert_eq!(program.details_snippet.chars().count(), 203);
    }
}

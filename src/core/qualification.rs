use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::core::parsing::{
    contains_term, first_number, is_recommendation, is_restrictive_degree, keyword_terms, named_language_tests,
    required_terms, requirement_text, significant_words, LanguageTest, RequirementText, COURSE_VOCABULARY,
    EXPERIENCE_VOCABULARY, MAX_GPA_SCALE,
};
use crate::core::traits::QualificationEvaluator;
use crate::models::{Qualification, QualificationStatus, StructuredRequirements, UserProfile, Verdict};

use QualificationStatus::{Met, NotMet, Partial, Unknown};

/// Deterministic, rule-based qualification check
///
/// Every category is decided from the requirement text and the profile
/// alone, so results are reproducible and cheap to compute.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedEvaluator;

#[async_trait]
impl QualificationEvaluator for RuleBasedEvaluator {
    async fn evaluate(&self, profile: &UserProfile, requirements: &StructuredRequirements) -> Qualification {
        evaluate_rules(profile, requirements)
    }

    fn name(&self) -> &'static str {
        "rules"
    }
}

/// Evaluate all five categories
pub fn evaluate_rules(profile: &UserProfile, requirements: &StructuredRequirements) -> Qualification {
    Qualification {
        gpa: evaluate_gpa(profile.gpa, &requirements.gpa_requirement),
        language: evaluate_language(profile, &requirements.language_requirement),
        prerequisites: evaluate_prerequisites(&profile.background, &requirements.prerequisite_courses),
        degree: evaluate_degree(profile.degree.as_deref(), &requirements.degree_requirement),
        other: evaluate_other(&profile.experience, &requirements.other_requirements),
    }
}

/// GPA: compare against the first number in the requirement text
///
/// A stated number always wins over "waived" or "not specified" wording
/// elsewhere in the field.
pub fn evaluate_gpa(user_gpa: Option<f64>, text: &str) -> Verdict {
    let Some(required) = first_number(text) else {
        return match requirement_text(text) {
            RequirementText::Absent => Verdict::new(Met, "No GPA requirement stated"),
            RequirementText::Unavailable => Verdict::new(Unknown, "GPA requirement not available"),
            RequirementText::Stated => Verdict::new(Met, "No minimum GPA stated"),
        };
    };

    if !(required > 0.0 && required <= MAX_GPA_SCALE) {
        return Verdict::new(
            Unknown,
            format!("GPA requirement \"{}\" is not on a 4-point scale", text.trim()),
        );
    }
    match user_gpa {
        None => Verdict::new(Unknown, format!("No GPA on file to compare with the required {required}")),
        Some(gpa) if gpa >= required => Verdict::new(Met, format!("GPA {gpa} meets the required {required}")),
        Some(gpa) => Verdict::new(NotMet, format!("GPA {gpa} is below the required {required}")),
    }
}

fn user_score(profile: &UserProfile, test: LanguageTest) -> Option<f64> {
    match test {
        LanguageTest::Toefl => profile.toefl,
        LanguageTest::Ielts => profile.ielts,
    }
}

/// Language: TOEFL or IELTS thresholds, tests considered in the order named
///
/// Named tests are alternatives: any held score meeting its threshold is
/// enough. A named test the applicant holds no score for cannot be shown.
/// Once any test carries a threshold, exception clauses ("may be waived",
/// "not required for native speakers") no longer decide the verdict.
pub fn evaluate_language(profile: &UserProfile, text: &str) -> Verdict {
    let named = named_language_tests(text);

    if !named.iter().any(|n| n.threshold.is_some()) {
        match requirement_text(text) {
            RequirementText::Absent => return Verdict::new(Met, "No language test required"),
            RequirementText::Unavailable => return Verdict::new(Unknown, "Language requirement not available"),
            RequirementText::Stated if named.is_empty() => {
                return Verdict::new(Unknown, "No TOEFL or IELTS requirement recognised");
            }
            RequirementText::Stated => {}
        }
    }

    let held: Vec<_> = named
        .iter()
        .filter_map(|n| user_score(profile, n.test).map(|score| (n, score)))
        .collect();

    if held.is_empty() {
        let tests = named.iter().map(|n| n.test.to_string()).collect::<Vec<_>>().join(" or ");
        return Verdict::new(NotMet, format!("Requires {tests} but no score on file"));
    }

    if let Some((named_test, score)) = held
        .iter()
        .find(|(n, score)| n.threshold.map_or(true, |required| *score >= required))
    {
        let reason = match named_test.threshold {
            Some(required) => format!("{} {score} meets the required {required}", named_test.test),
            None => format!("{} {score} on file; no minimum stated", named_test.test),
        };
        return Verdict::new(Met, reason);
    }

    let (named_test, score) = held[0];
    let required = named_test.threshold.unwrap_or_default();
    Verdict::new(
        NotMet,
        format!("{} {score} is below the required {required}", named_test.test),
    )
}

/// Keyword overlap between required vocabulary terms and what the applicant has
fn keyword_overlap(required: &BTreeSet<&'static str>, have: &BTreeSet<&'static str>) -> (Vec<String>, Vec<String>) {
    let (covered, missing): (Vec<&str>, Vec<&str>) = required.iter().copied().partition(|term| have.contains(term));
    (
        covered.into_iter().map(str::to_string).collect(),
        missing.into_iter().map(str::to_string).collect(),
    )
}

/// Prerequisites: required courses against the applicant's background
pub fn evaluate_prerequisites(background: &[String], text: &str) -> Verdict {
    let required = required_terms(text, COURSE_VOCABULARY);
    if required.is_empty() {
        return match requirement_text(text) {
            RequirementText::Absent => Verdict::new(Met, "No prerequisite courses required"),
            RequirementText::Unavailable => Verdict::new(Unknown, "Prerequisite requirements not available"),
            RequirementText::Stated => Verdict::new(Unknown, "Could not identify specific prerequisite courses"),
        };
    }

    let have = keyword_terms(background, COURSE_VOCABULARY);
    let (covered, missing) = keyword_overlap(&required, &have);

    if missing.is_empty() {
        Verdict::new(Met, format!("Background covers all required courses: {}", covered.join(", ")))
    } else if !covered.is_empty() {
        Verdict::new(
            Partial,
            format!(
                "Background covers {} of {} required courses; missing: {}",
                covered.len(),
                required.len(),
                missing.join(", ")
            ),
        )
        .with_missing(missing)
    } else {
        Verdict::new(NotMet, format!("Missing required courses: {}", missing.join(", "))).with_missing(missing)
    }
}

/// Degree: met unless the text is unusually restrictive
pub fn evaluate_degree(user_degree: Option<&str>, text: &str) -> Verdict {
    if !is_restrictive_degree(text) {
        return match requirement_text(text) {
            RequirementText::Absent => Verdict::new(Met, "No degree requirement stated"),
            RequirementText::Unavailable => Verdict::new(Unknown, "Degree requirement not available"),
            RequirementText::Stated => Verdict::new(Met, "Standard bachelor's degree requirement"),
        };
    }

    let Some(degree) = user_degree.map(str::trim).filter(|d| !d.is_empty()) else {
        return Verdict::new(Unknown, "Program restricts prior degree; no degree on file");
    };
    let lower = text.to_lowercase();
    if significant_words(degree).iter().any(|w| contains_term(&lower, w)) {
        Verdict::new(Met, format!("Degree \"{degree}\" matches the required background"))
    } else {
        Verdict::new(
            Partial,
            format!("Program expects a specific degree background; \"{degree}\" may not qualify"),
        )
    }
}

/// Other requirements: experience keywords, softened when only recommended
pub fn evaluate_other(experience: &[String], text: &str) -> Verdict {
    let required = required_terms(text, EXPERIENCE_VOCABULARY);
    if required.is_empty() {
        return match requirement_text(text) {
            RequirementText::Absent => Verdict::new(Met, "No additional requirements"),
            RequirementText::Unavailable => Verdict::new(Unknown, "Additional requirements not available"),
            RequirementText::Stated => Verdict::new(Unknown, "Could not identify specific additional requirements"),
        };
    }

    let have = keyword_terms(experience, EXPERIENCE_VOCABULARY);
    let (covered, missing) = keyword_overlap(&required, &have);

    if missing.is_empty() {
        Verdict::new(Met, format!("Experience covers: {}", covered.join(", ")))
    } else if !covered.is_empty() {
        Verdict::new(
            Partial,
            format!("Experience covers {}; missing: {}", covered.join(", "), missing.join(", ")),
        )
        .with_missing(missing)
    } else if is_recommendation(text) {
        Verdict::new(Partial, format!("Recommended but not shown: {}", missing.join(", "))).with_missing(missing)
    } else {
        Verdict::new(NotMet, format!("Missing: {}", missing.join(", "))).with_missing(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequirementCategory;

    fn profile() -> UserProfile {
        UserProfile {
            name: Some("Test Applicant".to_string()),
            gpa: Some(3.2),
            toefl: Some(95.0),
            ielts: None,
            background: vec!["Python".to_string(), "Calculus".to_string(), "Statistics".to_string()],
            degree: Some("Bachelor of Science in Computer Science".to_string()),
            experience: vec!["Research assistant".to_string(), "Summer internship".to_string()],
            target_field: Some("Computer Science".to_string()),
            preferred_countries: vec!["United States".to_string()],
        }
    }

    #[test]
    fn test_gpa_below_requirement() {
        let verdict = evaluate_gpa(Some(3.2), "3.5+ GPA required");
        assert_eq!(verdict.status, NotMet);
        assert!(verdict.reason.contains("3.2"));
        assert!(verdict.reason.contains("3.5"));
    }

    #[test]
    fn test_gpa_meets_requirement() {
        assert_eq!(evaluate_gpa(Some(3.5), "Minimum GPA 3.5").status, Met);
        assert_eq!(evaluate_gpa(Some(3.9), "3.0/4.0").status, Met);
    }

    #[test]
    fn test_gpa_without_number_is_met() {
        assert_eq!(evaluate_gpa(Some(3.2), "Strong academic record").status, Met);
        assert_eq!(evaluate_gpa(Some(3.2), "").status, Met);
        assert_eq!(evaluate_gpa(None, "GPA not required").status, Met);
    }

    #[test]
    fn test_gpa_missing_on_profile_is_unknown() {
        assert_eq!(evaluate_gpa(None, "3.0 minimum").status, Unknown);
    }

    #[test]
    fn test_gpa_other_scale_is_unknown() {
        assert_eq!(evaluate_gpa(Some(3.8), "80% average").status, Unknown);
    }

    #[test]
    fn test_language_toefl() {
        let p = profile();
        assert_eq!(evaluate_language(&p, "TOEFL 90+").status, Met);
        assert_eq!(evaluate_language(&p, "TOEFL 100 minimum").status, NotMet);
    }

    #[test]
    fn test_language_either_test_counts() {
        let p = UserProfile {
            toefl: Some(95.0),
            ielts: Some(7.5),
            ..profile()
        };
        let verdict = evaluate_language(&p, "TOEFL 100 or IELTS 7.0");
        assert_eq!(verdict.status, Met);
        assert!(verdict.reason.starts_with("IELTS"));
    }

    #[test]
    fn test_language_named_test_without_score() {
        let p = UserProfile { toefl: None, ielts: None, ..profile() };
        let verdict = evaluate_language(&p, "IELTS 6.5 overall");
        assert_eq!(verdict.status, NotMet);
        assert!(verdict.reason.contains("IELTS"));
    }

    #[test]
    fn test_language_not_required_or_unrecognised() {
        let p = profile();
        assert_eq!(evaluate_language(&p, "Not required for native speakers").status, Met);
        assert_eq!(evaluate_language(&p, "").status, Met);
        assert_eq!(evaluate_language(&p, "English proficiency").status, Unknown);
    }

    #[test]
    fn test_stated_threshold_wins_over_exception_clauses() {
        let low_toefl = UserProfile {
            toefl: Some(80.0),
            ielts: None,
            ..profile()
        };
        assert_eq!(
            evaluate_language(
                &low_toefl,
                "TOEFL 100 minimum; may be waived for graduates of English-medium universities"
            )
            .status,
            NotMet
        );
        assert_eq!(
            evaluate_language(&low_toefl, "TOEFL 100 (not required for native English speakers)").status,
            NotMet
        );

        assert_eq!(evaluate_gpa(Some(2.5), "Minimum 3.0 GPA; GRE not required").status, NotMet);

        let ielts_only = UserProfile {
            toefl: None,
            ielts: Some(7.5),
            ..profile()
        };
        assert_eq!(
            evaluate_language(&ielts_only, "IELTS 7.0 overall; TOEFL score not specified").status,
            Met
        );
    }

    #[test]
    fn test_waived_test_without_threshold_is_met() {
        let p = UserProfile { toefl: None, ielts: None, ..profile() };
        assert_eq!(evaluate_language(&p, "TOEFL not required").status, Met);
        assert_eq!(evaluate_language(&p, "IELTS or TOEFL: not specified").status, Unknown);
    }

    #[test]
    fn test_stated_courses_win_over_waiver_clauses() {
        let background = vec!["Python".to_string()];

        let verdict = evaluate_prerequisites(
            &background,
            "Linear algebra and Python; programming waived for computer science graduates",
        );
        assert_eq!(verdict.status, Partial);
        assert_eq!(verdict.missing, vec!["linear algebra".to_string()]);

        assert_eq!(
            evaluate_prerequisites(&background, "Calculus required; further courses not specified").status,
            NotMet
        );
    }

    #[test]
    fn test_other_ignores_waived_tests() {
        let experience: Vec<String> = vec![];
        let verdict = evaluate_other(&experience, "Two years of work experience; GRE not required");
        assert_eq!(verdict.status, NotMet);
        assert_eq!(verdict.missing, vec!["work experience".to_string()]);

        assert_eq!(evaluate_other(&experience, "GRE not required").status, Met);
    }

    #[test]
    fn test_prerequisites_statuses() {
        let background = profile().background;

        assert_eq!(evaluate_prerequisites(&background, "Calculus and Python").status, Met);

        let partial = evaluate_prerequisites(&background, "Calculus, Linear Algebra, Data Structures");
        assert_eq!(partial.status, Partial);
        assert_eq!(partial.missing, vec!["data structures".to_string(), "linear algebra".to_string()]);

        let not_met = evaluate_prerequisites(&background, "Microeconomics and Accounting");
        assert_eq!(not_met.status, NotMet);

        assert_eq!(evaluate_prerequisites(&background, "Solid quantitative skills").status, Unknown);
        assert_eq!(evaluate_prerequisites(&background, "No prerequisites").status, Met);
    }

    #[test]
    fn test_degree_rules() {
        let degree = Some("Bachelor of Science in Computer Science");
        assert_eq!(evaluate_degree(degree, "Bachelor's degree").status, Met);
        assert_eq!(
            evaluate_degree(degree, "Bachelor's degree in computer science or a related field").status,
            Met
        );
        assert_eq!(
            evaluate_degree(Some("BA in History"), "Must hold a degree in engineering").status,
            Partial
        );
        assert_eq!(evaluate_degree(None, "Relevant bachelor's degree").status, Unknown);
    }

    #[test]
    fn test_other_recommended_is_partial() {
        let experience: Vec<String> = vec![];
        assert_eq!(evaluate_other(&experience, "Research experience recommended").status, Partial);
        assert_eq!(evaluate_other(&experience, "Two years of work experience").status, NotMet);
        assert_eq!(
            evaluate_other(&profile().experience, "Research experience and internship").status,
            Met
        );
    }

    #[test]
    fn test_default_requirements_evaluate_to_unknown() {
        let q = evaluate_rules(&profile(), &StructuredRequirements::default());
        for (_, verdict) in q.entries() {
            assert_eq!(verdict.status, Unknown);
        }
    }

    #[test]
    fn test_all_categories_present() {
        let requirements = StructuredRequirements {
            tuition: "$45,000".to_string(),
            gpa_requirement: "3.0".to_string(),
            language_requirement: "TOEFL 90".to_string(),
            prerequisite_courses: "Calculus".to_string(),
            degree_requirement: "Bachelor's degree".to_string(),
            other_requirements: "GRE optional".to_string(),
        };
        let q = tokio_test::block_on(RuleBasedEvaluator.evaluate(&profile(), &requirements));
        let categories: Vec<RequirementCategory> = q.entries().iter().map(|(c, _)| *c).collect();
        assert_eq!(categories, RequirementCategory::ALL.to_vec());
        assert_eq!(q.gpa.status, Met);
        assert_eq!(q.other.status, Partial);
    }
}

//! Small text heuristics used by the qualification rules.
//!
//! Every function here is pure and works on free-form requirement text as
//! produced by the enrichment step or typed by an applicant.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Highest value accepted as a GPA-scale threshold
pub const MAX_GPA_SCALE: f64 = 5.0;

const NOT_REQUIRED_PHRASES: &[&str] = &[
    "not required",
    "no requirement",
    "no minimum",
    "not applicable",
    "waived",
    "no prerequisites",
];

const UNSTATED_PHRASES: &[&str] = &[
    "not specified",
    "unspecified",
    "unknown",
    "not available",
    "see program website",
    "check program website",
];

const RECOMMENDATION_PHRASES: &[&str] = &[
    "recommended",
    "preferred",
    "optional",
    "encouraged",
    "desirable",
    "a plus",
];

/// Phrases that make a degree requirement stricter than "any bachelor's"
pub const RESTRICTIVE_DEGREE_PHRASES: &[&str] = &[
    "related field",
    "relevant bachelor",
    "degree in the same",
    "must hold a degree in",
    "engineering degree required",
    "phd required",
    "master's degree required",
    "accredited",
];

/// Controlled vocabulary for prerequisite courses: canonical term and its spellings
pub const COURSE_VOCABULARY: &[(&str, &[&str])] = &[
    ("python", &["python"]),
    ("java", &["java"]),
    ("c++", &["c++", "cpp"]),
    ("javascript", &["javascript"]),
    ("sql", &["sql"]),
    ("matlab", &["matlab"]),
    ("programming", &["programming", "coding"]),
    ("data structures", &["data structures", "data structure"]),
    ("algorithms", &["algorithms", "algorithm"]),
    ("calculus", &["calculus"]),
    ("linear algebra", &["linear algebra"]),
    ("discrete mathematics", &["discrete math", "discrete mathematics"]),
    ("statistics", &["statistics", "statistical"]),
    ("probability", &["probability"]),
    ("machine learning", &["machine learning"]),
    ("operating systems", &["operating systems"]),
    ("databases", &["databases", "database systems"]),
    ("microeconomics", &["microeconomics"]),
    ("macroeconomics", &["macroeconomics"]),
    ("econometrics", &["econometrics"]),
    ("accounting", &["accounting"]),
    ("finance", &["finance", "financial"]),
    ("physics", &["physics"]),
    ("chemistry", &["chemistry"]),
    ("biology", &["biology"]),
];

/// Controlled vocabulary for experience-type requirements
pub const EXPERIENCE_VOCABULARY: &[(&str, &[&str])] = &[
    ("research", &["research", "research experience", "research assistant"]),
    ("publications", &["publication", "publications", "published"]),
    ("internship", &["internship", "internships", "intern"]),
    (
        "work experience",
        &[
            "work experience",
            "professional experience",
            "industry experience",
            "years of experience",
            "full-time",
            "engineer",
            "developer",
            "analyst",
        ],
    ),
    ("teaching", &["teaching", "teaching assistant", "tutoring"]),
    ("leadership", &["leadership"]),
    ("volunteering", &["volunteer", "volunteering"]),
    ("projects", &["project", "projects"]),
    ("portfolio", &["portfolio"]),
    ("gre", &["gre"]),
    ("gmat", &["gmat"]),
];

/// How a requirement field reads as a whole
///
/// Only consulted when nothing in the field can be parsed: a stated
/// threshold or course wins over "waived" or "not specified" clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementText {
    /// Empty or explicitly "not required"
    Absent,
    /// The source did not say ("not specified", "unknown")
    Unavailable,
    Stated,
}

pub fn requirement_text(text: &str) -> RequirementText {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() || lower == "none" || lower == "no" {
        return RequirementText::Absent;
    }
    if NOT_REQUIRED_PHRASES.iter().any(|p| lower.contains(p)) {
        return RequirementText::Absent;
    }
    if lower == "n/a" || UNSTATED_PHRASES.iter().any(|p| lower.contains(p)) {
        return RequirementText::Unavailable;
    }
    RequirementText::Stated
}

/// True when the text softens a requirement ("recommended", "preferred")
pub fn is_recommendation(text: &str) -> bool {
    let lower = text.to_lowercase();
    RECOMMENDATION_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn is_restrictive_degree(text: &str) -> bool {
    let lower = text.to_lowercase();
    RESTRICTIVE_DEGREE_PHRASES.iter().any(|p| lower.contains(p))
}

fn number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("number regex"))
}

fn toefl_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\btoefl\b").expect("toefl name regex"))
}

fn ielts_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bielts\b").expect("ielts name regex"))
}

fn toefl_score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\btoefl\b[^0-9]{0,25}?(\d{2,3})\b").expect("toefl score regex"))
}

fn ielts_score_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bielts\b[^0-9]{0,25}?(\d(?:\.\d)?)\b").expect("ielts score regex"))
}

fn gpa_notes_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bgpa\b[^0-9]{0,12}?(\d(?:\.\d{1,2})?)|(\d\.\d{1,2})\s*(?:/\s*4(?:\.0)?\s*)?gpa\b")
            .expect("gpa notes regex")
    })
}

/// First numeric token in the text, e.g. `3.5` in "3.5+ GPA required"
pub fn first_number(text: &str) -> Option<f64> {
    number_regex()
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// TOEFL threshold and its byte position, if the text names a plausible score
pub fn toefl_threshold(text: &str) -> Option<(usize, f64)> {
    toefl_score_regex()
        .captures(text)
        .and_then(|caps| {
            let start = caps.get(0)?.start();
            let score = caps.get(1)?.as_str().parse::<f64>().ok()?;
            Some((start, score))
        })
        .filter(|(_, score)| (0.0..=120.0).contains(score))
}

/// IELTS band threshold and its byte position
pub fn ielts_threshold(text: &str) -> Option<(usize, f64)> {
    ielts_score_regex()
        .captures(text)
        .and_then(|caps| {
            let start = caps.get(0)?.start();
            let score = caps.get(1)?.as_str().parse::<f64>().ok()?;
            Some((start, score))
        })
        .filter(|(_, score)| (0.0..=9.0).contains(score))
}

/// GPA mentioned in applicant notes ("GPA 3.6", "3.8/4.0 GPA")
pub fn gpa_in_notes(text: &str) -> Option<f64> {
    let caps = gpa_notes_regex().captures(text)?;
    let value = caps.get(1).or_else(|| caps.get(2))?.as_str().parse::<f64>().ok()?;
    (value > 0.0 && value <= MAX_GPA_SCALE).then_some(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageTest {
    Toefl,
    Ielts,
}

impl std::fmt::Display for LanguageTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LanguageTest::Toefl => write!(f, "TOEFL"),
            LanguageTest::Ielts => write!(f, "IELTS"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NamedTest {
    pub test: LanguageTest,
    pub threshold: Option<f64>,
    position: usize,
}

/// Language tests named in the text, in order of appearance
pub fn named_language_tests(text: &str) -> Vec<NamedTest> {
    let mut named = Vec::with_capacity(2);

    if let Some(m) = toefl_name_regex().find(text) {
        named.push(NamedTest {
            test: LanguageTest::Toefl,
            threshold: toefl_threshold(text).map(|(_, score)| score),
            position: m.start(),
        });
    }
    if let Some(m) = ielts_name_regex().find(text) {
        named.push(NamedTest {
            test: LanguageTest::Ielts,
            threshold: ielts_threshold(text).map(|(_, score)| score),
            position: m.start(),
        });
    }

    named.sort_by_key(|t| t.position);
    named
}

/// Whole-term containment on an already lower-cased haystack
///
/// A match only counts when it is not glued to surrounding letters or
/// digits, so "java" does not match inside "javascript".
pub fn contains_term(haystack: &str, term: &str) -> bool {
    haystack.match_indices(term).any(|(start, matched)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[start + matched.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Canonical vocabulary terms found in the text
pub fn extract_terms(text: &str, vocabulary: &[(&'static str, &[&str])]) -> BTreeSet<&'static str> {
    let lower = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|(_, spellings)| spellings.iter().any(|s| contains_term(&lower, s)))
        .map(|(canonical, _)| *canonical)
        .collect()
}

fn is_waiver(clause: &str) -> bool {
    NOT_REQUIRED_PHRASES.iter().any(|p| clause.contains(p))
}

/// Canonical terms the text asks for
///
/// Clauses that waive something ("GRE not required", "(waived for
/// graduates)") do not contribute terms.
pub fn required_terms(text: &str, vocabulary: &[(&'static str, &[&str])]) -> BTreeSet<&'static str> {
    text.to_lowercase()
        .split(|c: char| matches!(c, ';' | ',' | '.' | '(' | ')' | '\n'))
        .filter(|clause| !is_waiver(clause))
        .flat_map(|clause| extract_terms(clause, vocabulary))
        .collect()
}

/// Canonical terms covered by a list of applicant keywords
pub fn keyword_terms(keywords: &[String], vocabulary: &[(&'static str, &[&str])]) -> BTreeSet<&'static str> {
    extract_terms(&keywords.join(" | "), vocabulary)
}

/// Words of a degree descriptor worth looking for in a requirement
pub fn significant_words(text: &str) -> Vec<String> {
    const IGNORED: &[&str] = &[
        "bachelor", "bachelors", "bachelor's", "master", "masters", "master's", "degree", "science",
        "arts", "with", "from", "honours", "honors", "major", "minor", "university",
    ];

    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| w.len() >= 4 && !IGNORED.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirement_text_classes() {
        assert_eq!(requirement_text(""), RequirementText::Absent);
        assert_eq!(requirement_text("GRE not required"), RequirementText::Absent);
        assert_eq!(requirement_text("None"), RequirementText::Absent);
        assert_eq!(
            requirement_text("Not specified - see program website"),
            RequirementText::Unavailable
        );
        assert_eq!(requirement_text("N/A"), RequirementText::Unavailable);
        assert_eq!(requirement_text("3.0 minimum GPA"), RequirementText::Stated);
    }

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("3.5+ GPA required"), Some(3.5));
        assert_eq!(first_number("Minimum 3.0 on a 4.0 scale"), Some(3.0));
        assert_eq!(first_number("Strong academic record"), None);
    }

    #[test]
    fn test_toefl_threshold() {
        assert_eq!(toefl_threshold("TOEFL 90+ or IELTS 7.0+").map(|t| t.1), Some(90.0));
        assert_eq!(toefl_threshold("TOEFL iBT minimum of 100").map(|t| t.1), Some(100.0));
        assert_eq!(toefl_threshold("TOEFL or IELTS 7.0"), None);
        assert_eq!(toefl_threshold("TOEFL 900"), None);
    }

    #[test]
    fn test_ielts_threshold() {
        assert_eq!(ielts_threshold("TOEFL 90+ or IELTS 7.0+").map(|t| t.1), Some(7.0));
        assert_eq!(ielts_threshold("IELTS overall band 6.5").map(|t| t.1), Some(6.5));
        assert_eq!(ielts_threshold("IELTS required"), None);
    }

    #[test]
    fn test_named_tests_in_order() {
        let named = named_language_tests("IELTS 7.0 or TOEFL 100");
        assert_eq!(named.len(), 2);
        assert_eq!(named[0].test, LanguageTest::Ielts);
        assert_eq!(named[0].threshold, Some(7.0));
        assert_eq!(named[1].test, LanguageTest::Toefl);
        assert_eq!(named[1].threshold, Some(100.0));

        assert!(named_language_tests("English proficiency required").is_empty());
    }

    #[test]
    fn test_gpa_in_notes() {
        assert_eq!(gpa_in_notes("GPA 3.5, TOEFL 105"), Some(3.5));
        assert_eq!(gpa_in_notes("graduated with a 3.8/4.0 GPA"), Some(3.8));
        assert_eq!(gpa_in_notes("GPA: 85"), None);
        assert_eq!(gpa_in_notes("no scores yet"), None);
    }

    #[test]
    fn test_contains_term_respects_boundaries() {
        assert!(contains_term("python and java", "java"));
        assert!(!contains_term("javascript only", "java"));
        assert!(contains_term("c++, python", "c++"));
        assert!(!contains_term("linear algebraic", "linear algebra"));
    }

    #[test]
    fn test_extract_terms() {
        let terms = extract_terms(
            "Calculus, Linear Algebra and programming experience in Python",
            COURSE_VOCABULARY,
        );
        assert!(terms.contains("calculus"));
        assert!(terms.contains("linear algebra"));
        assert!(terms.contains("programming"));
        assert!(terms.contains("python"));
        assert_eq!(terms.len(), 4);
    }

    #[test]
    fn test_required_terms_skip_waived_clauses() {
        let terms = required_terms(
            "Research experience recommended; GRE not required",
            EXPERIENCE_VOCABULARY,
        );
        assert_eq!(terms.into_iter().collect::<Vec<_>>(), vec!["research"]);

        let terms = required_terms(
            "Calculus and statistics (programming waived for mathematics graduates)",
            COURSE_VOCABULARY,
        );
        assert!(terms.contains("calculus"));
        assert!(terms.contains("statistics"));
        assert!(!terms.contains("programming"));

        assert!(required_terms("No prerequisites", COURSE_VOCABULARY).is_empty());
    }

    #[test]
    fn test_keyword_terms_do_not_join_across_entries() {
        let keywords = vec!["Linear".to_string(), "Algebra".to_string()];
        assert!(keyword_terms(&keywords, COURSE_VOCABULARY).is_empty());
    }

    #[test]
    fn test_significant_words() {
        let words = significant_words("Bachelor of Science in Computer Science");
        assert_eq!(words, vec!["computer".to_string()]);
    }
}

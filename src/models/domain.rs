use serde::{Deserialize, Serialize};

/// Applicant profile collected from the chat
///
/// Immutable for the duration of a matching run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gpa: Option<f64>,
    #[serde(default)]
    pub toefl: Option<f64>,
    #[serde(default)]
    pub ielts: Option<f64>,
    /// Courses, languages and skills, e.g. "Python", "Linear Algebra"
    #[serde(default)]
    pub background: Vec<String>,
    #[serde(default)]
    pub degree: Option<String>,
    /// Research, internships, work history keywords
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(alias = "targetField", default)]
    pub target_field: Option<String>,
    #[serde(alias = "preferredCountries", default)]
    pub preferred_countries: Vec<String>,
}

impl UserProfile {
    /// Fill missing test scores from free-text notes such as "GPA 3.5, TOEFL 105".
    ///
    /// Values already on the profile are never overwritten.
    pub fn with_inferred_scores(mut self, notes: &str) -> Self {
        use crate::core::parsing::{gpa_in_notes, ielts_threshold, toefl_threshold};

        if self.gpa.is_none() {
            self.gpa = gpa_in_notes(notes);
        }
        if self.toefl.is_none() {
            self.toefl = toefl_threshold(notes).map(|(_, score)| score);
        }
        if self.ielts.is_none() {
            self.ielts = ielts_threshold(notes).map(|(_, score)| score);
        }
        self
    }
}

/// Program returned by nearest-neighbour retrieval
///
/// Ephemeral: produced per retrieval and consumed by the tier classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramCandidate {
    #[serde(rename = "school")]
    pub school_name: String,
    #[serde(rename = "program")]
    pub program_name: String,
    pub country: String,
    /// Institutional ranking, lower is more prestigious
    pub ranking: Option<u32>,
    /// Cosine distance to the profile embedding, lower is more similar
    pub distance: f64,
    #[serde(default)]
    pub degree_type: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(skip_serializing, default)]
    pub program_details: String,
    #[serde(skip_serializing, default)]
    pub language_text: Option<String>,
}

impl ProgramCandidate {
    /// Identity used for de-duplication across tiers
    pub fn key(&self) -> (String, String) {
        (
            self.school_name.trim().to_lowercase(),
            self.program_name.trim().to_lowercase(),
        )
    }

    /// Program details cut to a display-sized snippet
    pub fn details_snippet(&self) -> String {
        const SNIPPET_CHARS: usize = 200;

        let details = self.program_details.trim();
        if details.chars().count() <= SNIPPET_CHARS {
            return details.to_string();
        }
        let cut: String = details.chars().take(SNIPPET_CHARS).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Admission risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Dream,
    Target,
    Safe,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Dream => write!(f, "dream"),
            Tier::Target => write!(f, "target"),
            Tier::Safe => write!(f, "safe"),
        }
    }
}

/// Standardized admission requirements for one program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredRequirements {
    pub tuition: String,
    pub gpa_requirement: String,
    pub language_requirement: String,
    pub prerequisite_courses: String,
    pub degree_requirement: String,
    pub other_requirements: String,
}

pub const UNSPECIFIED_REQUIREMENT: &str = "Not specified - see program website";

impl Default for StructuredRequirements {
    fn default() -> Self {
        Self {
            tuition: UNSPECIFIED_REQUIREMENT.to_string(),
            gpa_requirement: UNSPECIFIED_REQUIREMENT.to_string(),
            language_requirement: UNSPECIFIED_REQUIREMENT.to_string(),
            prerequisite_courses: UNSPECIFIED_REQUIREMENT.to_string(),
            degree_requirement: UNSPECIFIED_REQUIREMENT.to_string(),
            other_requirements: UNSPECIFIED_REQUIREMENT.to_string(),
        }
    }
}

/// Why an enrichment fell back to the default requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultReason {
    CallFailed,
    InvalidPayload,
    DeadlineExceeded,
}

impl std::fmt::Display for DefaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultReason::CallFailed => write!(f, "call failed"),
            DefaultReason::InvalidPayload => write!(f, "invalid payload"),
            DefaultReason::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

/// Outcome of enriching a single candidate
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    Extracted(StructuredRequirements),
    Defaulted(DefaultReason),
}

impl Enrichment {
    pub fn requirements(&self) -> StructuredRequirements {
        match self {
            Enrichment::Extracted(requirements) => requirements.clone(),
            Enrichment::Defaulted(_) => StructuredRequirements::default(),
        }
    }

    pub fn source(&self) -> RequirementsSource {
        match self {
            Enrichment::Extracted(_) => RequirementsSource::Extracted,
            Enrichment::Defaulted(_) => RequirementsSource::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementsSource {
    Extracted,
    Default,
}

/// Verdict for a single requirement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    Met,
    Partial,
    NotMet,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequirementCategory {
    Gpa,
    Language,
    Prerequisites,
    Degree,
    Other,
}

impl RequirementCategory {
    pub const ALL: [RequirementCategory; 5] = [
        RequirementCategory::Gpa,
        RequirementCategory::Language,
        RequirementCategory::Prerequisites,
        RequirementCategory::Degree,
        RequirementCategory::Other,
    ];
}

/// Status plus a human-readable justification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub status: QualificationStatus,
    pub reason: String,
    /// Required vocabulary terms the applicant lacks
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl Verdict {
    pub fn new(status: QualificationStatus, reason: impl Into<String>) -> Self {
        Self {
            status,
            reason: reason.into(),
            missing: Vec::new(),
        }
    }

    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = missing;
        self
    }
}

/// One verdict per requirement category; all five are always present
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qualification {
    pub gpa: Verdict,
    pub language: Verdict,
    pub prerequisites: Verdict,
    pub degree: Verdict,
    pub other: Verdict,
}

impl Qualification {
    pub fn get(&self, category: RequirementCategory) -> &Verdict {
        match category {
            RequirementCategory::Gpa => &self.gpa,
            RequirementCategory::Language => &self.language,
            RequirementCategory::Prerequisites => &self.prerequisites,
            RequirementCategory::Degree => &self.degree,
            RequirementCategory::Other => &self.other,
        }
    }

    pub fn entries(&self) -> [(RequirementCategory, &Verdict); 5] {
        RequirementCategory::ALL.map(|category| (category, self.get(category)))
    }
}

/// Final per-program record returned to the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedProgram {
    #[serde(flatten)]
    pub candidate: ProgramCandidate,
    pub tier: Tier,
    pub match_score: f64,
    pub details_snippet: String,
    #[serde(flatten)]
    pub requirements: StructuredRequirements,
    pub requirements_source: RequirementsSource,
    pub qualification_status: Qualification,
    #[serde(default)]
    pub gaps: Vec<String>,
}

/// Three tier lists produced by one matching run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TieredPrograms {
    pub dream: Vec<ClassifiedProgram>,
    pub target: Vec<ClassifiedProgram>,
    pub safe: Vec<ClassifiedProgram>,
}

impl TieredPrograms {
    pub fn len(&self) -> usize {
        self.dream.len() + self.target.len() + self.safe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedProgram> {
        self.dream.iter().chain(self.target.iter()).chain(self.safe.iter())
    }
}

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::core::traits::RequirementEnricher;
use crate::models::domain::UNSPECIFIED_REQUIREMENT;
use crate::models::{DefaultReason, Enrichment, ProgramCandidate, StructuredRequirements};
use crate::services::llm::{truncate_chars, LlmClient};

const MAX_DETAILS_CHARS: usize = 4000;

const EXTRACTION_PROMPT: &str = "You extract graduate admission requirements from program descriptions. \
Answer with a JSON object with exactly these string keys: tuition, gpa_requirement, language_requirement, \
prerequisite_courses, degree_requirement, other_requirements. Quote the program's own wording where possible. \
Use \"Not specified\" when the description does not mention a requirement and \"Not required\" when it says \
the requirement does not apply.";

/// Shape of the model's answer before validation
///
/// Every key is optional and loosely typed; `validate` decides what is usable.
#[derive(Debug, Default, Deserialize)]
pub struct RawRequirements {
    #[serde(default)]
    pub tuition: Option<Value>,
    #[serde(default, alias = "gpa")]
    pub gpa_requirement: Option<Value>,
    #[serde(default, alias = "language")]
    pub language_requirement: Option<Value>,
    #[serde(default, alias = "prerequisites")]
    pub prerequisite_courses: Option<Value>,
    #[serde(default, alias = "degree")]
    pub degree_requirement: Option<Value>,
    #[serde(default, alias = "other")]
    pub other_requirements: Option<Value>,
}

impl RawRequirements {
    /// Accept the answer when at least one field carries text
    ///
    /// Blank fields get the conservative default wording. A missing language
    /// field falls back to the catalogue's own language text.
    pub fn validate(self, candidate: &ProgramCandidate) -> Option<StructuredRequirements> {
        let language = field_text(self.language_requirement).or_else(|| {
            candidate
                .language_text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
        });

        let fields = [
            field_text(self.tuition),
            field_text(self.gpa_requirement),
            language,
            field_text(self.prerequisite_courses),
            field_text(self.degree_requirement),
            field_text(self.other_requirements),
        ];

        if fields.iter().all(Option::is_none) {
            return None;
        }

        let [tuition, gpa, language, prerequisites, degree, other] =
            fields.map(|f| f.unwrap_or_else(|| UNSPECIFIED_REQUIREMENT.to_string()));

        Some(StructuredRequirements {
            tuition,
            gpa_requirement: gpa,
            language_requirement: language,
            prerequisite_courses: prerequisites,
            degree_requirement: degree,
            other_requirements: other,
        })
    }
}

/// Text for one field: strings as-is, numbers formatted, string lists joined
fn field_text(value: Option<Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn program_prompt(candidate: &ProgramCandidate) -> String {
    let mut prompt = format!(
        "School: {}\nProgram: {}\nCountry: {}\n",
        candidate.school_name, candidate.program_name, candidate.country
    );
    if let Some(ref degree) = candidate.degree_type {
        prompt.push_str(&format!("Degree type: {}\n", degree));
    }
    if let Some(ref duration) = candidate.duration {
        prompt.push_str(&format!("Duration: {}\n", duration));
    }
    if let Some(ref language) = candidate.language_text {
        prompt.push_str(&format!("Language requirements: {}\n", language));
    }
    prompt.push_str("Program details:\n");
    prompt.push_str(truncate_chars(&candidate.program_details, MAX_DETAILS_CHARS));
    prompt
}

/// Requirement enricher backed by the chat model
pub struct LlmRequirementEnricher {
    llm: Arc<LlmClient>,
}

impl LlmRequirementEnricher {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl RequirementEnricher for LlmRequirementEnricher {
    async fn enrich(&self, candidate: &ProgramCandidate) -> Enrichment {
        let raw: RawRequirements = match self.llm.chat_json(EXTRACTION_PROMPT, &program_prompt(candidate)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    school = %candidate.school_name,
                    program = %candidate.program_name,
                    "Requirement extraction failed: {}",
                    e
                );
                return Enrichment::Defaulted(e.default_reason());
            }
        };

        match raw.validate(candidate) {
            Some(requirements) => Enrichment::Extracted(requirements),
            None => {
                tracing::warn!(
                    school = %candidate.school_name,
                    program = %candidate.program_name,
                    "Model returned no usable requirement fields"
                );
                Enrichment::Defaulted(DefaultReason::InvalidPayload)
            }
        }
    }
}

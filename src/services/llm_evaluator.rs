use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::core::qualification::evaluate_rules;
use crate::core::traits::QualificationEvaluator;
use crate::models::{Qualification, QualificationStatus, StructuredRequirements, UserProfile, Verdict};
use crate::services::llm::LlmClient;

const ASSESSMENT_PROMPT: &str = "You assess whether an applicant meets a graduate program's admission requirements. \
Answer with a JSON object with keys gpa, language, prerequisites, degree and other. Each value is an object \
{\"status\": one of \"met\", \"partial\", \"not_met\", \"unknown\", \"reason\": a short justification}. \
Use \"unknown\" when the requirement or the applicant's data is missing.";

/// Model answer, one loosely typed entry per category
#[derive(Debug, Default, Deserialize)]
struct Assessment {
    #[serde(default)]
    gpa: Option<Value>,
    #[serde(default)]
    language: Option<Value>,
    #[serde(default)]
    prerequisites: Option<Value>,
    #[serde(default)]
    degree: Option<Value>,
    #[serde(default)]
    other: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ModelVerdict {
    status: QualificationStatus,
    #[serde(default)]
    reason: String,
}

/// Take the model's verdict when well-formed, else the rule verdict
fn pick(answer: Option<Value>, rules: Verdict) -> Verdict {
    match answer.and_then(|v| serde_json::from_value::<ModelVerdict>(v).ok()) {
        Some(verdict) => {
            let reason = verdict.reason.trim();
            let reason = if reason.is_empty() { "Assessed by language model" } else { reason };
            Verdict::new(verdict.status, reason)
        }
        None => rules,
    }
}

fn merge(assessment: Assessment, rules: Qualification) -> Qualification {
    Qualification {
        gpa: pick(assessment.gpa, rules.gpa),
        language: pick(assessment.language, rules.language),
        prerequisites: pick(assessment.prerequisites, rules.prerequisites),
        degree: pick(assessment.degree, rules.degree),
        other: pick(assessment.other, rules.other),
    }
}

/// Qualification evaluator that asks the chat model
///
/// Categories the model leaves out or garbles are filled by the rule-based
/// evaluator; a failed call falls back to rules entirely.
pub struct LlmQualificationEvaluator {
    llm: Arc<LlmClient>,
}

impl LlmQualificationEvaluator {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl QualificationEvaluator for LlmQualificationEvaluator {
    async fn evaluate(&self, profile: &UserProfile, requirements: &StructuredRequirements) -> Qualification {
        let rules = evaluate_rules(profile, requirements);
        let prompt = json!({
            "applicant": profile,
            "requirements": requirements,
        })
        .to_string();

        match self.llm.chat_json::<Assessment>(ASSESSMENT_PROMPT, &prompt).await {
            Ok(assessment) => merge(assessment, rules),
            Err(e) => {
                tracing::warn!("Model assessment failed, using rules: {}", e);
                rules
            }
        }
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

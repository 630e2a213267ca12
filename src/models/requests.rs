use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use crate::models::domain::UserProfile;

/// Request to classify programs for a profile
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifyRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "sessionId", default)]
    pub session_id: Option<String>,
    pub profile: UserProfile,
    #[validate(length(min = 1), custom(function = "finite_embedding"))]
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub filters: Option<FilterParams>,
    /// Free-text notes used to fill missing test scores
    #[serde(alias = "additionalInfo", default)]
    pub additional_info: Option<String>,
}

/// Optional retrieval filters supplied by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub countries: Option<Vec<String>>,
    #[serde(alias = "maxRanking", default)]
    pub max_ranking: Option<u32>,
}

#[allow(clippy::ptr_arg)]
fn finite_embedding(embedding: &Vec<f32>) -> Result<(), ValidationError> {
    if embedding.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::new("non_finite_embedding"))
    }
}

/// Query for a stored snapshot
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SnapshotQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "session_id", rename = "sessionId")]
    pub session_id: String,
}

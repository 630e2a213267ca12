use serde::{Deserialize, Serialize};
use crate::models::domain::ClassifiedProgram;

/// Response for the classify endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub dream: Vec<ClassifiedProgram>,
    pub target: Vec<ClassifiedProgram>,
    pub safe: Vec<ClassifiedProgram>,
    pub total_candidates: usize,
    pub session_id: Option<String>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

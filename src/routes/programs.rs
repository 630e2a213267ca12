use actix_web::{web, HttpResponse, Responder};
use validator::Validate;
use crate::core::{MatchError, Matcher, SearchFilters};
use crate::models::{ClassifyRequest, ClassifyResponse, ErrorResponse, HealthResponse, SnapshotQuery};
use crate::services::{PgProgramStore, StoreError};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: Matcher,
    pub store: Arc<PgProgramStore>,
}

/// Configure all program-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/programs/classify", web::post().to(classify_programs))
        .route("/programs/snapshot", web::get().to(get_snapshot));
}

fn error_response(status: actix_web::http::StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let db_healthy = state.store.health_check().await.unwrap_or(false);

    let status = if db_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Classify programs endpoint
///
/// POST /api/v1/programs/classify
///
/// Request body:
/// ```json
/// {
///   "sessionId": "string",
///   "profile": { "gpa": 3.6, "toefl": 105, "background": ["Python"] },
///   "embedding": [0.01, -0.02],
///   "filters": { "field": "cs", "countries": ["UK"] },
///   "additionalInfo": "string"
/// }
/// ```
///
/// When `sessionId` is present the result replaces that session's snapshot.
async fn classify_programs(state: web::Data<AppState>, req: web::Json<ClassifyRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for classify request: field_errors={:?}", errors);
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    let req = req.into_inner();
    let profile = match req.additional_info.as_deref() {
        Some(notes) => req.profile.with_inferred_scores(notes),
        None => req.profile,
    };
    let filters = SearchFilters::resolve(req.filters.as_ref(), &profile);

    tracing::info!(
        session_id = ?req.session_id,
        field = ?filters.field,
        countries = ?filters.countries,
        "Classifying programs"
    );

    let outcome = match state.matcher.classify(&profile, &req.embedding, &filters).await {
        Ok(outcome) => outcome,
        Err(MatchError::InvalidEmbedding(message)) => {
            return error_response(actix_web::http::StatusCode::BAD_REQUEST, "Invalid embedding", message);
        }
        Err(e @ MatchError::Retrieval(_)) => {
            tracing::error!("Classification failed: {}", e);
            return error_response(
                actix_web::http::StatusCode::BAD_GATEWAY,
                "could not generate recommendations",
                e.to_string(),
            );
        }
    };

    let mut generated_at = chrono::Utc::now();
    if let Some(ref session_id) = req.session_id {
        match state.store.replace_snapshot(session_id, &profile, &outcome.tiers).await {
            Ok(stored_at) => generated_at = stored_at,
            Err(e) => tracing::warn!("Failed to store snapshot for {}: {}", session_id, e),
        }
    }

    tracing::info!(
        run_id = %outcome.run_id,
        "Returning {} programs (from {} candidates)",
        outcome.tiers.len(),
        outcome.total_candidates
    );

    HttpResponse::Ok().json(ClassifyResponse {
        dream: outcome.tiers.dream,
        target: outcome.tiers.target,
        safe: outcome.tiers.safe,
        total_candidates: outcome.total_candidates,
        session_id: req.session_id,
        generated_at,
    })
}

/// Get the stored snapshot for a session
///
/// GET /api/v1/programs/snapshot?sessionId={sessionId}
async fn get_snapshot(state: web::Data<AppState>, query: web::Query<SnapshotQuery>) -> impl Responder {
    if let Err(errors) = query.validate() {
        return error_response(
            actix_web::http::StatusCode::BAD_REQUEST,
            "Validation failed",
            errors.to_string(),
        );
    }

    match state.store.load_snapshot(&query.session_id).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(e @ StoreError::NotFound(_)) => {
            error_response(actix_web::http::StatusCode::NOT_FOUND, "Snapshot not found", e.to_string())
        }
        Err(e) => {
            tracing::error!("Failed to load snapshot for {}: {}", query.session_id, e);
            error_response(
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load snapshot",
                e.to_string(),
            )
        }
    }
}

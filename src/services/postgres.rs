use async_trait::async_trait;
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::core::filters::SearchFilters;
use crate::core::traits::{CandidateRetriever, RetrievalError};
use crate::models::{ClassifiedProgram, ProgramCandidate, TieredPrograms, UserProfile};

/// Errors that can occur when reading or writing snapshots
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Stored result of the latest classification run for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub session_id: String,
    pub profile: UserProfile,
    #[serde(flatten)]
    pub tiers: TieredPrograms,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

const RETRIEVE_SQL: &str = r#"
    SELECT
        school_name, program_name, country_region, qs_ranking,
        degree_type, duration, program_details, language_requirements,
        (embedding <=> $1::vector)::float8 AS distance
    FROM programs
    WHERE embedding IS NOT NULL
      AND ($2::text IS NULL OR field_tag = $2)
      AND (cardinality($3::text[]) = 0 OR lower(country_region) = ANY($3))
      AND ($4::int IS NULL OR qs_ranking <= $4)
    ORDER BY distance ASC
    LIMIT $5
"#;

/// PostgreSQL program catalogue and snapshot store
///
/// Candidate retrieval uses pgvector cosine distance (`<=>`). Snapshots are
/// written as a full replace per session so concurrent re-runs never merge.
#[derive(Clone)]
pub struct PgProgramStore {
    pool: PgPool,
}

impl PgProgramStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Replace the stored snapshot for a session
    ///
    /// Uses INSERT ... ON CONFLICT so the latest run always wins whole.
    pub async fn replace_snapshot(
        &self,
        session_id: &str,
        profile: &UserProfile,
        tiers: &TieredPrograms,
    ) -> Result<chrono::DateTime<chrono::Utc>, StoreError> {
        let query = r#"
            INSERT INTO match_snapshots (session_id, profile, dream, target, safe, generated_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (session_id)
            DO UPDATE SET
                profile = EXCLUDED.profile,
                dream = EXCLUDED.dream,
                target = EXCLUDED.target,
                safe = EXCLUDED.safe,
                generated_at = EXCLUDED.generated_at
            RETURNING generated_at
        "#;

        let row = sqlx::query(query)
            .bind(session_id)
            .bind(Json(profile))
            .bind(Json(&tiers.dream))
            .bind(Json(&tiers.target))
            .bind(Json(&tiers.safe))
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!(session_id, programs = tiers.len(), "Replaced match snapshot");

        Ok(row.try_get("generated_at")?)
    }

    pub async fn load_snapshot(&self, session_id: &str) -> Result<MatchSnapshot, StoreError> {
        let query = r#"
            SELECT session_id, profile, dream, target, safe, generated_at
            FROM match_snapshots
            WHERE session_id = $1
        "#;

        let row = sqlx::query(query)
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("No snapshot for session {}", session_id)))?;

        let profile: Json<UserProfile> = row.try_get("profile")?;
        let dream: Json<Vec<ClassifiedProgram>> = row.try_get("dream")?;
        let target: Json<Vec<ClassifiedProgram>> = row.try_get("target")?;
        let safe: Json<Vec<ClassifiedProgram>> = row.try_get("safe")?;

        Ok(MatchSnapshot {
            session_id: row.try_get("session_id")?,
            profile: profile.0,
            tiers: TieredPrograms {
                dream: dream.0,
                target: target.0,
                safe: safe.0,
            },
            generated_at: row.try_get("generated_at")?,
        })
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

#[async_trait]
impl CandidateRetriever for PgProgramStore {
    async fn retrieve(
        &self,
        embedding: &[f32],
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Vec<ProgramCandidate>, RetrievalError> {
        let countries: Vec<String> = filters.countries.iter().map(|c| c.to_lowercase()).collect();
        let max_ranking = filters.max_ranking.map(|r| i32::try_from(r).unwrap_or(i32::MAX));

        let rows = sqlx::query(RETRIEVE_SQL)
            .bind(Vector::from(embedding.to_vec()))
            .bind(filters.field.as_deref())
            .bind(&countries)
            .bind(max_ranking)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let candidates = rows
            .iter()
            .map(|row| {
                let ranking: Option<i32> = row.try_get("qs_ranking")?;
                Ok::<_, sqlx::Error>(ProgramCandidate {
                    school_name: row.try_get("school_name")?,
                    program_name: row.try_get("program_name")?,
                    country: row.try_get::<Option<String>, _>("country_region")?.unwrap_or_default(),
                    ranking: ranking.and_then(|r| u32::try_from(r).ok()).filter(|&r| r > 0),
                    distance: row.try_get("distance")?,
                    degree_type: row.try_get("degree_type")?,
                    duration: row.try_get("duration")?,
                    program_details: row.try_get::<Option<String>, _>("program_details")?.unwrap_or_default(),
                    language_text: row.try_get("language_requirements")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            candidates = candidates.len(),
            field = ?filters.field,
            countries = ?filters.countries,
            "Vector search complete"
        );

        Ok(candidates)
    }
}

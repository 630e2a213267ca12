use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::core::{RunSettings, ScoreBands, TierPolicy};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub llm: LlmSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub tiers: TierPolicy,
    #[serde(default)]
    pub scoring: ScoreBands,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            api_key: None,
            model: default_llm_model(),
            timeout_secs: default_llm_timeout_secs(),
            temperature: 0.0,
        }
    }
}

fn default_llm_endpoint() -> String { "https://api.openai.com/v1".to_string() }
fn default_llm_model() -> String { "gpt-4o-mini".to_string() }
fn default_llm_timeout_secs() -> u64 { 30 }

/// Which qualification evaluator backs the matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorKind {
    #[default]
    Rules,
    Llm,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
    #[serde(default = "default_enrichment_concurrency")]
    pub enrichment_concurrency: usize,
    /// Per-run budget; enrichment still pending afterwards is defaulted
    #[serde(default)]
    pub deadline_ms: Option<u64>,
    #[serde(default)]
    pub evaluator: EvaluatorKind,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            candidate_limit: default_candidate_limit(),
            enrichment_concurrency: default_enrichment_concurrency(),
            deadline_ms: None,
            evaluator: EvaluatorKind::default(),
        }
    }
}

impl MatchingSettings {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            candidate_limit: self.candidate_limit,
            enrichment_concurrency: self.enrichment_concurrency,
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

fn default_candidate_limit() -> usize { 50 }
fn default_enrichment_concurrency() -> usize { 5 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with GRADMATCH)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., GRADMATCH__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize()
    }

    /// Load configuration from a custom path
    ///
    /// Environment overrides apply exactly as in [`Settings::load`].
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::load_from_with(path, |name| std::env::var(name).ok())
    }

    fn load_from_with<P, F>(path: P, lookup: F) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        substitute_vars(settings, lookup)?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("GRADMATCH")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply the conventional DATABASE_URL and OPENAI_API_KEY variables
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    substitute_vars(settings, |name| std::env::var(name).ok())
}

fn substitute_vars<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(database_url) = lookup("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Some(api_key) = lookup("OPENAI_API_KEY") {
        builder = builder.set_override("llm.api_key", api_key)?;
    }

    builder.build()
}

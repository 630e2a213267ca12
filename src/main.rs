use actix_cors::Cors;
use actix_web::{error, middleware, web, App, HttpRequest, HttpResponse, HttpServer};
use gradmatch::config::{EvaluatorKind, LoggingSettings, Settings};
use gradmatch::core::{Matcher, QualificationEvaluator, RuleBasedEvaluator};
use gradmatch::models::ErrorResponse;
use gradmatch::routes::{self, programs::AppState};
use gradmatch::services::{LlmClient, LlmConfig, LlmQualificationEvaluator, LlmRequirementEnricher, PgProgramStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};
use tracing_subscriber::EnvFilter;

fn bad_request(error: &str, message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: 400,
    })
}

/// Malformed request bodies get the same error shape as validation failures
fn json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    info!("JSON payload error on {}: {}", req.path(), err);
    let response = bad_request("invalid_json", format!("Invalid JSON: {}", err));
    error::InternalError::from_response(err, response).into()
}

fn query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = bad_request("invalid_query", format!("Invalid query: {}", err));
    error::InternalError::from_response(err, response).into()
}

fn init_logging(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    init_logging(&settings.logging);

    info!("Starting GradMatch classification service...");

    // Initialize PostgreSQL program store
    let db_max_conn = settings.database.max_connections.unwrap_or(10);
    let db_min_conn = settings.database.min_connections.unwrap_or(1);

    let store = Arc::new(
        PgProgramStore::new(
            &settings.database.url,
            db_max_conn,
            db_min_conn,
            Duration::from_secs(settings.database.acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(settings.database.idle_timeout_secs.unwrap_or(600)),
        )
        .await
        .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?,
    );

    info!("PostgreSQL program store initialized (max: {} connections)", db_max_conn);

    // Initialize language model client
    let llm = Arc::new(
        LlmClient::new(LlmConfig {
            endpoint: settings.llm.endpoint.clone(),
            api_key: settings.llm.api_key.clone(),
            model: settings.llm.model.clone(),
            timeout: Duration::from_secs(settings.llm.timeout_secs),
            temperature: settings.llm.temperature,
        })
        .map_err(|e| startup_error("Failed to create LLM client", e))?,
    );

    if settings.llm.api_key.is_none() {
        tracing::warn!("No LLM API key configured; requirement extraction will fall back to defaults");
    }

    let evaluator: Arc<dyn QualificationEvaluator> = match settings.matching.evaluator {
        EvaluatorKind::Rules => Arc::new(RuleBasedEvaluator),
        EvaluatorKind::Llm => Arc::new(LlmQualificationEvaluator::new(llm.clone())),
    };

    let matcher = Matcher::new(
        settings.tiers,
        settings.scoring,
        settings.matching.run_settings(),
        store.clone(),
        Arc::new(LlmRequirementEnricher::new(llm.clone())),
        evaluator,
    )
    .map_err(|e| startup_error("Invalid matching policy", e))?;

    info!(
        evaluator = matcher.evaluator_name(),
        model = llm.model(),
        "Matcher initialized with policy: {:?}",
        matcher.policy()
    );

    // Build application state
    let app_state = AppState { matcher, store };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(query_payload_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}

//! Lore API server entry point.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use lore_core::clock::SystemClock;
use lore_llm::{OpenAiCompatibleClient, SharedLlmSettings};
use lore_narrative::domain::prompts::PromptSet;
use lore_store::{MIGRATOR, PgAdventureRepository, PgScenarioRepository};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use lore_api::config::Config;
use lore_api::error::AppError;
use lore_api::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    let tracer_provider = lore_api::telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Lore API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(AppError::from)?;
    MIGRATOR.run(&pool).await.map_err(AppError::from)?;

    let prompts = PromptSet::load(config.prompts_dir.as_deref()).map_err(AppError::Prompts)?;
    let llm_settings = SharedLlmSettings::new(config.llm.clone());
    let llm = OpenAiCompatibleClient::new(llm_settings.clone(), config.api_key.clone())
        .map_err(AppError::from)?;

    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(PgScenarioRepository::new(pool.clone())),
        Arc::new(PgAdventureRepository::new(pool)),
        Arc::new(llm),
        llm_settings,
        prompts,
        config.turn,
    );

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = lore_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::from)?;
    axum::serve(listener, app).await.map_err(AppError::from)?;

    if let Some(provider) = tracer_provider {
        provider.shutdown()?;
    }
    Ok(())
}

mod accounts;
mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod inbox;
mod llm_client;
mod members;
mod models;
mod profiles;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod testing;
mod triage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;
use crate::triage::domains::DOMAINS;
use crate::triage::pipeline::PipelineSettings;
use crate::triage::{ChatPipeline, KnowledgeBase, KnowledgeRouter, SafetyGate};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Arogya API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(db));

    // Load domain reference content once; missing files degrade to no content
    let knowledge = KnowledgeBase::load(&config.knowledge_dir, DOMAINS);
    let gate = SafetyGate::with_default_phrases();
    info!("Safety gate loaded with {} emergency phrases", gate.phrases().len());

    let router = KnowledgeRouter::new(knowledge, config.domain_score_threshold);
    info!("Knowledge router min score: {}", router.min_score());

    let pipeline = ChatPipeline::new(
        gate,
        router,
        PipelineSettings {
            max_message_chars: config.max_message_chars,
            max_tokens: config.max_completion_tokens,
        },
    );

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        store,
        llm: Arc::new(llm),
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod config;
mod errors;
mod llm_client;
mod pipeline;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::pipeline::composer::AnalysisComposer;
use crate::pipeline::extractor::DocumentExtractor;
use crate::pipeline::fetch::{FetchClient, FetchOptions};
use crate::pipeline::orchestrator::Orchestrator;
use crate::pipeline::reducer::TextReducer;
use crate::pipeline::Limits;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Jobfit API v{}", env!("CARGO_PKG_VERSION"));

    // A missing key is not fatal: each analysis request reports it instead.
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; analysis requests will fail until it is configured");
    }
    let llm = LlmClient::new(config.openai_api_key.clone(), &config.llm_api_base)?;
    info!(
        "LLM client initialized (model: {}, base: {})",
        llm_client::MODEL,
        config.llm_api_base
    );

    let fetcher = FetchClient::new(FetchOptions::default())?;

    let limits = Limits::default();
    let orchestrator = Orchestrator::new(
        Arc::new(fetcher),
        TextReducer::new(limits),
        DocumentExtractor,
        AnalysisComposer::new(Arc::new(llm), limits),
    );

    if config.diagnostics {
        warn!("Diagnostic mode enabled: internal error traces are included in responses");
    }

    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        diagnostics: config.diagnostics,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

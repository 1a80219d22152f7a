mod config;
mod errors;
mod extraction;
mod keywords;
mod llm_client;
mod models;
mod pipeline;
mod render;
mod rewrite;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::extraction::PdfTextExtractor;
use crate::keywords::StatisticalKeywordExtractor;
use crate::llm_client::LlmClient;
use crate::pipeline::{Components, Limits, Pipeline};
use crate::render::{PageLayout, PdfRenderer};
use crate::rewrite::LlmResumeRewriter;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // The HTTP client timeout sits just above the pipeline's own deadline.
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.anthropic_api_url.clone(),
        config.generation_timeout() + std::time::Duration::from_secs(5),
    )?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let components = Components {
        text_extractor: Arc::new(PdfTextExtractor),
        keyword_extractor: Arc::new(StatisticalKeywordExtractor::new(config.keyword_limit)),
        rewriter: Arc::new(LlmResumeRewriter::new(llm)),
        renderer: Arc::new(PdfRenderer::new(PageLayout::default())),
    };
    let pipeline = Pipeline::new(components, Limits::from_config(&config));
    info!(
        "Pipeline ready: max upload {} bytes, generation timeout {}s, session TTL {}s",
        config.max_upload_bytes, config.generation_timeout_secs, config.session_ttl_secs
    );

    spawn_session_sweeper(pipeline.clone(), &config);

    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops sessions that have been idle longer than the TTL.
fn spawn_session_sweeper(pipeline: Pipeline, config: &Config) {
    let ttl = config.session_ttl();
    let mut interval = tokio::time::interval(config.sweep_interval());
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tokio::spawn(async move {
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            pipeline.sweep_expired(ttl).await;
        }
    });
}

mod config;
mod document;
mod errors;
mod extraction;
mod matcher;
mod nlp;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, NlpBackend};
use crate::extraction::PatternExtractor;
use crate::nlp::{Annotator, EntityRuler, HeuristicAnnotator, LanguagePipeline, RemoteAnnotator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on invalid env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume API v{}", env!("CARGO_PKG_VERSION"));

    // Rule file problems must stop startup, never surface per request
    let ruler = EntityRuler::from_path(&config.skill_patterns_path)
        .with_context(|| format!("Failed to load entity rules from '{}'", config.skill_patterns_path))?;

    let annotator = build_annotator(&config)?;
    info!("Language pipeline initialized (backend: {})", annotator.backend());
    let pipeline = LanguagePipeline::new(annotator, ruler);

    let extractor =
        PatternExtractor::with_default_rules().context("Failed to compile extraction rules")?;
    info!("Pattern extractor initialized ({} rule groups)", extractor.rules().len());

    let state = AppState::new(config.clone(), pipeline, extractor);

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

fn build_annotator(config: &Config) -> Result<Arc<dyn Annotator>> {
    match &config.nlp_backend {
        NlpBackend::Heuristic => Ok(Arc::new(HeuristicAnnotator)),
        NlpBackend::Remote { url } => {
            let annotator =
                RemoteAnnotator::new(url.clone()).context("Failed to build annotation client")?;
            info!("Remote annotation service: {}", annotator.endpoint());
            Ok(Arc::new(annotator))
        }
    }
}

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::config::Config;
use crate::extraction::extractor::PatternExtractor;
use crate::nlp::LanguagePipeline;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is built once at startup and never mutated.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Annotator + entity ruler. Backend chosen via NLP_BACKEND.
    pub pipeline: Arc<LanguagePipeline>,
    pub extractor: Arc<PatternExtractor>,
    /// Bounds in-flight extractions (MAX_CONCURRENT_EXTRACTIONS, default 1).
    pub extraction_permits: Arc<Semaphore>,
}

impl AppState {
    pub fn new(config: Config, pipeline: LanguagePipeline, extractor: PatternExtractor) -> Self {
        let permits = config.max_concurrent_extractions.max(1);
        Self {
            config,
            pipeline: Arc::new(pipeline),
            extractor: Arc::new(extractor),
            extraction_permits: Arc::new(Semaphore::new(permits)),
        }
    }
}

#[cfg(test)]
pub fn test_state(ruler_jsonl: &str) -> AppState {
    use crate::nlp::{EntityRuler, HeuristicAnnotator};

    let ruler = EntityRuler::from_jsonl(ruler_jsonl, "test").expect("test rules are valid");
    let pipeline = LanguagePipeline::new(Arc::new(HeuristicAnnotator), ruler);
    let extractor = PatternExtractor::with_default_rules().expect("default rules compile");
    AppState::new(Config::default(), pipeline, extractor)
}

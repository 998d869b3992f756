// Resume entity extraction
// Implements: built-in pattern rules, entity passthrough, upload handlers.
// All annotation goes through nlp::LanguagePipeline; no tagging logic here.

pub mod extractor;
pub mod handlers;
pub mod models;
pub mod rules;
pub mod service;

pub use extractor::PatternExtractor;

//! Upload → text → annotations → extraction result.
//!
//! Failures before text is available are `DocumentUnreadable`; a failing
//! annotator is a single `Pipeline` error. No partial results are returned.

use bytes::Bytes;
use tracing::{debug, info};

use crate::document::extract_pdf_text_blocking;
use crate::errors::AppError;
use crate::extraction::extractor::PatternExtractor;
use crate::extraction::models::ExtractionResult;
use crate::nlp::LanguagePipeline;

/// Extracts entities from PDF bytes.
pub async fn extract_from_pdf(
    bytes: Bytes,
    pipeline: &LanguagePipeline,
    extractor: &PatternExtractor,
) -> Result<ExtractionResult, AppError> {
    let size = bytes.len();
    let text = extract_pdf_text_blocking(bytes).await?;
    debug!("PDF of {size} bytes yielded {} characters", text.len());
    extract_from_text(&text, pipeline, extractor).await
}

/// Extracts entities from already-extracted plain text.
pub async fn extract_from_text(
    text: &str,
    pipeline: &LanguagePipeline,
    extractor: &PatternExtractor,
) -> Result<ExtractionResult, AppError> {
    let doc = pipeline.process(text).await?;
    let result = extractor.extract(&doc);
    info!(
        "Extraction complete: backend={}, tokens={}, matches={}",
        pipeline.backend(),
        doc.tokens.len(),
        result.total()
    );
    Ok(result)
}

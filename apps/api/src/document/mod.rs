//! Text extraction from uploaded documents.
//!
//! Everything that can go wrong here collapses into `DocumentError`, which the
//! HTTP layer reports as the single "document unreadable" error. PDF parsing is
//! CPU-bound and must run inside `tokio::task::spawn_blocking`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

/// The PDF header must appear within the first 1024 bytes.
const PDF_HEADER_WINDOW: usize = 1024;
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("document is empty")]
    Empty,

    #[error("invalid upload encoding: {0}")]
    Encoding(String),

    #[error("document is not a PDF")]
    NotPdf,

    #[error("failed to extract text: {0}")]
    Extraction(String),

    #[error("document contains no extractable text")]
    NoText,
}

/// Decodes a browser data URL (`data:application/pdf;base64,JVBERi0...`).
pub fn decode_data_url(contents: &str) -> Result<Vec<u8>, DocumentError> {
    let (header, payload) = contents
        .split_once(',')
        .ok_or_else(|| DocumentError::Encoding("missing ',' separator".to_string()))?;
    if !header.trim_start().starts_with("data:") || !header.ends_with(";base64") {
        return Err(DocumentError::Encoding(
            "expected a base64 data URL".to_string(),
        ));
    }
    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(payload.as_bytes())
        .map_err(|e| DocumentError::Encoding(e.to_string()))?;
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }
    Ok(bytes)
}

pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}

/// Extracts plain text from PDF bytes. Blocking.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, DocumentError> {
    if bytes.is_empty() {
        return Err(DocumentError::Empty);
    }
    if !looks_like_pdf(bytes) {
        return Err(DocumentError::NotPdf);
    }

    // pdf-extract panics on some malformed inputs; contain it to this document.
    let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| DocumentError::Extraction("PDF parser panicked".to_string()))?
        .map_err(|e| DocumentError::Extraction(e.to_string()))?;

    if extracted.trim().is_empty() {
        return Err(DocumentError::NoText);
    }
    debug!(
        "Extracted {} characters from {} byte PDF",
        extracted.len(),
        bytes.len()
    );
    Ok(extracted)
}

/// One-page PDF with a name, an email and a job line, using a standard font.
#[cfg(test)]
pub const SAMPLE_RESUME_PDF: &[u8] =
    include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample_resume.pdf"));

/// Runs `extract_pdf_text` on the blocking pool.
pub async fn extract_pdf_text_blocking(bytes: Bytes) -> Result<String, DocumentError> {
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| DocumentError::Extraction(format!("extraction task failed: {e}")))?
}

//! Axum route handlers for the Extraction API.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::document::decode_data_url;
use crate::errors::AppError;
use crate::extraction::models::{ExtractionResult, ExtractionTable};
use crate::extraction::service::extract_from_pdf;
use crate::state::AppState;

/// Multipart field carrying the uploaded PDF.
pub const UPLOAD_FIELD: &str = "file";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DataUrlRequest {
    /// `data:application/pdf;base64,...` as produced by browser upload widgets.
    pub contents: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractionResponse {
    pub extraction_id: Uuid,
    pub extracted_at: DateTime<Utc>,
    pub result: ExtractionResult,
    pub table: ExtractionTable,
}

impl ExtractionResponse {
    fn new(result: ExtractionResult) -> Self {
        let table = result.to_table();
        Self {
            extraction_id: Uuid::new_v4(),
            extracted_at: Utc::now(),
            result,
            table,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/extract
///
/// Multipart upload with the PDF in the `file` field.
pub async fn handle_extract_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResponse>, AppError> {
    let mut upload: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((filename, data));
        break;
    }

    let (filename, data) = upload.ok_or_else(|| {
        AppError::Validation(format!("multipart field '{UPLOAD_FIELD}' is required"))
    })?;
    if data.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    run_extraction(&state, filename.as_deref(), data).await
}

/// POST /api/v1/resumes/extract/data-url
///
/// JSON body carrying the PDF as a base64 data URL.
pub async fn handle_extract_data_url(
    State(state): State<AppState>,
    Json(request): Json<DataUrlRequest>,
) -> Result<Json<ExtractionResponse>, AppError> {
    if request.contents.trim().is_empty() {
        return Err(AppError::Validation("contents cannot be empty".to_string()));
    }
    let bytes = decode_data_url(&request.contents)?;
    run_extraction(&state, request.filename.as_deref(), Bytes::from(bytes)).await
}

async fn run_extraction(
    state: &AppState,
    filename: Option<&str>,
    data: Bytes,
) -> Result<Json<ExtractionResponse>, AppError> {
    info!(
        "Received document '{}' ({} bytes)",
        filename.unwrap_or("<unnamed>"),
        data.len()
    );

    let _permit = state
        .extraction_permits
        .acquire()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction semaphore closed: {e}")))?;

    let result = extract_from_pdf(data, &state.pipeline, &state.extractor).await?;
    Ok(Json(ExtractionResponse::new(result)))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::Validation(err.body_text())
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::DocumentError;
use crate::nlp::AnnotatorError;

/// Message shown to the user whenever a document cannot be read.
pub const UNREADABLE_DOCUMENT_MESSAGE: &str =
    "Failed to process file. Please ensure it's a valid PDF document.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Document unreadable: {0}")]
    DocumentUnreadable(#[from] DocumentError),

    #[error("Language pipeline error: {0}")]
    Pipeline(#[from] AnnotatorError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::DocumentUnreadable(e) => {
                tracing::warn!("Rejected unreadable document: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "DOCUMENT_UNREADABLE",
                    UNREADABLE_DOCUMENT_MESSAGE.to_string(),
                )
            }
            AppError::Pipeline(e) => {
                tracing::error!("Language pipeline error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PIPELINE_ERROR",
                    "The language pipeline is unavailable".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_document_maps_to_422_with_fixed_message() {
        let response = AppError::from(DocumentError::NotPdf).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_pipeline_error_maps_to_502() {
        let err = AnnotatorError::Unavailable { retries: 3 };
        assert_eq!(AppError::from(err).into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let response = AppError::Validation("missing file".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    // base64 inflates the payload by a third, plus the JSON envelope
    let data_url_limit = upload_limit + upload_limit / 3 + 1024;

    Router::new()
        .route("/health", get(health::health_handler))
        // Extraction API
        .route(
            "/api/v1/resumes/extract",
            post(handlers::handle_extract_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/resumes/extract/data-url",
            post(handlers::handle_extract_data_url).layer(DefaultBodyLimit::max(data_url_limit)),
        )
        .with_state(state)
}

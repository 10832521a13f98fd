//! API routes for the analysis server

pub mod analyze;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Analysis - with larger body limit for file uploads
        .route(
            "/analyze",
            post(analyze::analyze_documents).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "doc-analyst",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Streamed multi-view LLM analysis of PDF, DOCX and text documents",
        "backend": {
            "provider": state.backend().name(),
            "model": state.backend().model(),
        },
        "views": ["main", "key_points", "summary"],
        "endpoints": {
            "POST /api/analyze": "Upload documents with a query (multipart), streams SSE events",
            "GET /api/info": "This document"
        }
    }))
}

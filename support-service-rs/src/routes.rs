// support-service-rs/src/routes.rs
// HTTP surface: the chat endpoint plus health and root

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::pipeline::SupportPipeline;
use crate::types::ChatRequest;

// Track service start time for uptime reporting
pub static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SupportPipeline>,
}

/// Error payload returned on a failed generation
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub msg: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub uptime_seconds: i64,
}

/// POST /api/chat - run one question through the pipeline
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    match state.pipeline.handle(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            log::error!("Error in chat: request_id={}, error={}", err.request_id, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    msg: "Error in chat".to_string(),
                    error: err.source.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health - Health check endpoint
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        healthy: true,
        service_name: "support-service".to_string(),
        uptime_seconds: START_TIME.elapsed().as_secs() as i64,
    })
}

/// GET / - Root endpoint
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "msg": "Welcome to the server",
        "service": "support-service",
        "endpoints": [
            "GET /health",
            "POST /api/chat"
        ]
    }))
}

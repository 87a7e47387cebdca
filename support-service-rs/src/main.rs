// support-service-rs/src/main.rs
// HTTP entry point for the monitored customer-support pipeline
// Default port 3000 - POST /api/chat

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use support_service::evaluate::AnswerEvaluator;
use support_service::generate::AnswerGenerator;
use support_service::llm_client::OpenAiCompatClient;
use support_service::pipeline::SupportPipeline;
use support_service::routes::{self, AppState};
use telemetry_sink::MetricsEmitter;

// Inbound request bodies are small; anything larger is not a chat question
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let _ = *routes::START_TIME;

    let llm_config = config_rs::LlmConfig::from_env();
    let sink_config = config_rs::SinkConfig::from_env();
    log::info!(
        "Using model {} at {} (telemetry {})",
        llm_config.model,
        llm_config.api_url,
        if sink_config.is_enabled() { "enabled" } else { "disabled" }
    );

    let model = Arc::new(OpenAiCompatClient::new(llm_config));
    let telemetry = Arc::new(MetricsEmitter::new(&sink_config)?);

    let pipeline = Arc::new(SupportPipeline::new(
        AnswerGenerator::new(model.clone()),
        AnswerEvaluator::new(model),
        telemetry,
    ));

    let state = Arc::new(AppState { pipeline });

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(routes::root_handler))
        .route("/health", get(routes::health_handler))
        .route("/api/chat", post(routes::chat_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state);

    let addr = config_rs::get_bind_address("SUPPORT", 3000);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Support service starting on {}", addr);
    println!("Support service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

// support-service-rs/src/llm_client.rs
//
// HTTP client for the generative model endpoint (OpenAI-compatible API)
//
// Configuration (.env file):
// - LLM_API_KEY: API key for the provider
// - LLM_API_URL: API endpoint URL (defaults to OpenAI compatible endpoint)
// - LLM_MODEL: Model to use

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use config_rs::LlmConfig;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Errors from the remote model call, classified by cause
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),
}

/// Reply from the model: free text plus total token usage
#[derive(Debug, Clone)]
pub struct ModelReply {
    pub text: String,
    pub tokens: u32,
}

/// The remote chat-model capability
///
/// Kept behind a trait so the generator and evaluator can be exercised
/// against stubbed models.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one single-turn completion. `json_output` asks the endpoint to
    /// return a JSON object body (used by the evaluator).
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_output: bool,
    ) -> Result<ModelReply, LlmError>;
}

/// Production client against an OpenAI-compatible chat-completions endpoint
pub struct OpenAiCompatClient {
    client: Client,
    config: LlmConfig,
}

impl OpenAiCompatClient {
    /// No client-side timeout is set here: a hung model call suspends only
    /// the task that made it.
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        json_output: bool,
    ) -> Result<ModelReply, LlmError> {
        let request_body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            response_format: if json_output {
                Some(ResponseFormat {
                    format_type: "json_object".to_string(),
                })
            } else {
                None
            },
        };

        let response = match self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_body)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                if err.is_timeout() {
                    return Err(LlmError::NetworkError(format!("Request timed out: {}", err)));
                } else if err.is_connect() {
                    return Err(LlmError::NetworkError(format!("Connection failed: {}", err)));
                }
                return Err(LlmError::NetworkError(format!("Network error: {}", err)));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();

            return match status.as_u16() {
                400 => Err(LlmError::InvalidRequest(format!("Bad request: {}", text))),
                401 => Err(LlmError::InvalidRequest(format!("Unauthorized: {}", text))),
                403 => Err(LlmError::InvalidRequest(format!("Forbidden: {}", text))),
                404 => Err(LlmError::InvalidRequest(format!("Not found: {}", text))),
                429 => Err(LlmError::RateLimitExceeded(format!(
                    "Rate limit exceeded: {}",
                    text
                ))),
                500 | 502 | 503 | 504 => Err(LlmError::ServerError(format!(
                    "Server error ({}): {}",
                    status, text
                ))),
                _ => Err(LlmError::UnknownError(format!(
                    "Unknown error ({}): {}",
                    status, text
                ))),
            };
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|err| LlmError::ParseError(format!("Failed to parse response: {}", err)))?;

        // Missing fields degrade to empty text / zero tokens rather than
        // failing the call
        let text = data
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default();
        let tokens = data.usage.map(|usage| usage.total_tokens).unwrap_or(0);

        Ok(ModelReply { text, tokens })
    }
}

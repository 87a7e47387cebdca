// support-service-rs/src/generate.rs
// Answer generation against the fixed support-agent instruction

use std::sync::Arc;
use std::time::Instant;

use crate::llm_client::{ChatModel, LlmError};
use crate::prompts::SUPPORT_AGENT_PROMPT;
use crate::types::AnswerResult;

/// Produces the customer-facing answer for one question
///
/// Failure policy: errors from the model propagate to the caller. There is
/// no safe default answer to a user's question.
pub struct AnswerGenerator {
    model: Arc<dyn ChatModel>,
}

impl AnswerGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Generate an answer, measuring wall-clock latency around the remote
    /// call. The raw question goes into the prompt unescaped; the prompt
    /// injection surface is an acknowledged risk, not mitigated here.
    pub async fn generate(&self, question: &str) -> Result<AnswerResult, LlmError> {
        let start = Instant::now();

        let reply = match self.model.complete(SUPPORT_AGENT_PROMPT, question, false).await {
            Ok(reply) => reply,
            Err(err) => {
                log::error!("Answer generation failed: {}", err);
                return Err(err);
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        log::info!(
            "Answer generated: latency_ms={}, tokens={}",
            latency_ms,
            reply.tokens
        );

        Ok(AnswerResult {
            answer: reply.text,
            latency_ms,
            tokens: reply.tokens,
        })
    }
}

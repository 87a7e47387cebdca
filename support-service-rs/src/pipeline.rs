// support-service-rs/src/pipeline.rs
// End-to-end sequencing for one chat request:
// classify -> generate -> evaluate -> emit metrics/log -> respond

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use telemetry_sink::MetricsEmitter;

use crate::classifier::classify_issue;
use crate::evaluate::AnswerEvaluator;
use crate::generate::AnswerGenerator;
use crate::llm_client::LlmError;
use crate::types::{ChatRequest, ChatResponse};

/// A request that failed before an answer was produced
///
/// Carries the correlation id so the transport layer can log the failure
/// against the same id the success path would have used.
#[derive(Debug, thiserror::Error)]
#[error("answer generation failed: {source}")]
pub struct PipelineError {
    pub request_id: String,
    #[source]
    pub source: LlmError,
}

/// Sequences the pipeline for one request and owns the telemetry emitter
pub struct SupportPipeline {
    generator: AnswerGenerator,
    evaluator: AnswerEvaluator,
    telemetry: Arc<MetricsEmitter>,
}

impl SupportPipeline {
    pub fn new(
        generator: AnswerGenerator,
        evaluator: AnswerEvaluator,
        telemetry: Arc<MetricsEmitter>,
    ) -> Self {
        Self {
            generator,
            evaluator,
            telemetry,
        }
    }

    /// Run one request end to end
    ///
    /// A failed generation fails the whole request and skips every
    /// telemetry step: no partial signals for a request whose answer was
    /// never produced. Evaluation cannot fail; telemetry failures are
    /// absorbed inside the emitter.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, PipelineError> {
        let start = Instant::now();
        let request_id = Uuid::new_v4().to_string();

        log::info!(
            "Request received: request_id={}, user_id={}, question={}",
            request_id,
            request.user_id,
            request.question
        );

        let issue_type = classify_issue(&request.question);
        let tags = vec![format!("issue_type:{}", issue_type)];

        let answer_result = match self.generator.generate(&request.question).await {
            Ok(result) => result,
            Err(source) => {
                return Err(PipelineError { request_id, source });
            }
        };
        log::info!(
            "Answer generated: request_id={}, latency_ms={}, tokens={}",
            request_id,
            answer_result.latency_ms,
            answer_result.tokens
        );

        let evaluation = self
            .evaluator
            .evaluate(&request.question, &answer_result.answer)
            .await;
        log::info!(
            "Evaluation generated: request_id={}, helpfulness={}, escalation_needed={}",
            request_id,
            evaluation.verdict.helpfulness,
            evaluation.verdict.escalation_needed
        );

        // Wall clock across the whole pipeline, not the sum of component
        // latencies; classification and orchestration overhead count too.
        let total_latency = start.elapsed().as_millis() as u64;

        let verdict = &evaluation.verdict;
        self.telemetry
            .gauge("latency.answer_ms", answer_result.latency_ms as f64, &tags)
            .await;
        self.telemetry
            .gauge("latency.eval_ms", evaluation.latency_ms as f64, &tags)
            .await;
        self.telemetry
            .gauge("latency.total_ms", total_latency as f64, &tags)
            .await;
        self.telemetry
            .gauge("quality.helpfulness", verdict.helpfulness, &tags)
            .await;
        self.telemetry
            .gauge("quality.safety", verdict.safety, &tags)
            .await;
        self.telemetry
            .gauge("quality.hallucination_risk", verdict.hallucination_risk, &tags)
            .await;
        self.telemetry
            .gauge(
                "escalation.needed",
                if verdict.escalation_needed { 1.0 } else { 0.0 },
                &tags,
            )
            .await;
        self.telemetry
            .count(
                "tokens.total",
                (answer_result.tokens + evaluation.tokens) as f64,
                &tags,
            )
            .await;
        self.telemetry.count("requests.total", 1.0, &tags).await;
        self.telemetry.flush().await;

        self.telemetry
            .send_log(json!({
                "level": "info",
                "message": "Chat completed",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "requestId": &request_id,
                "userId": request.user_id,
                "issueType": issue_type.to_string(),
                "question": request.question,
                "answer": &answer_result.answer,
                "evaluation": &evaluation.verdict,
                "latency": {
                    "answer": answer_result.latency_ms,
                    "eval": evaluation.latency_ms,
                    "total": total_latency,
                },
            }))
            .await;

        Ok(ChatResponse {
            answer: answer_result.answer,
            request_id,
            metrics: evaluation.verdict,
            latency: total_latency,
        })
    }
}

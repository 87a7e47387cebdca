// support-service-rs/src/tests/pipeline_integration_tests.rs
// End-to-end pipeline scenarios with stubbed models and a recording sink

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use telemetry_sink::{IntakeTransport, MetricSeries, MetricsEmitter, SinkError};

use crate::evaluate::AnswerEvaluator;
use crate::generate::AnswerGenerator;
use crate::llm_client::{ChatModel, LlmError, ModelReply};
use crate::pipeline::SupportPipeline;
use crate::types::ChatRequest;

/// Canned behavior for a stubbed model
enum StubBehavior {
    Reply {
        text: &'static str,
        tokens: u32,
        delay_ms: u64,
    },
    Fail,
}

struct StubModel {
    behavior: StubBehavior,
}

#[async_trait]
impl ChatModel for StubModel {
    async fn complete(
        &self,
        _system: &str,
        _user: &str,
        _json_output: bool,
    ) -> Result<ModelReply, LlmError> {
        match &self.behavior {
            StubBehavior::Reply {
                text,
                tokens,
                delay_ms,
            } => {
                if *delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                Ok(ModelReply {
                    text: text.to_string(),
                    tokens: *tokens,
                })
            }
            StubBehavior::Fail => Err(LlmError::ServerError("stub failure".to_string())),
        }
    }
}

/// Transport that records every payload instead of shipping it
#[derive(Default)]
struct RecordingIntake {
    series_payloads: Mutex<Vec<Vec<MetricSeries>>>,
    log_payloads: Mutex<Vec<Vec<Value>>>,
}

#[async_trait]
impl IntakeTransport for RecordingIntake {
    async fn send_series(&self, series: &[MetricSeries]) -> Result<(), SinkError> {
        self.series_payloads.lock().await.push(series.to_vec());
        Ok(())
    }

    async fn send_logs(&self, records: &[Value]) -> Result<(), SinkError> {
        self.log_payloads.lock().await.push(records.to_vec());
        Ok(())
    }
}

const GOOD_VERDICT: &str = r#"{"helpfulness":0.9,"safety":1.0,"hallucinationRisk":0.1,"escalationNeeded":false,"comment":"clear"}"#;

fn build_pipeline(
    generator_behavior: StubBehavior,
    evaluator_behavior: StubBehavior,
) -> (SupportPipeline, Arc<RecordingIntake>, Arc<MetricsEmitter>) {
    let intake = Arc::new(RecordingIntake::default());
    let emitter = Arc::new(MetricsEmitter::with_transport(
        "test",
        Some(intake.clone() as Arc<dyn IntakeTransport>),
    ));

    let pipeline = SupportPipeline::new(
        AnswerGenerator::new(Arc::new(StubModel {
            behavior: generator_behavior,
        })),
        AnswerEvaluator::new(Arc::new(StubModel {
            behavior: evaluator_behavior,
        })),
        emitter.clone(),
    );

    (pipeline, intake, emitter)
}

fn shipping_request() -> ChatRequest {
    ChatRequest {
        user_id: "u1".to_string(),
        question: "Where is my order #123?".to_string(),
    }
}

#[tokio::test]
async fn shipping_question_end_to_end() {
    let (pipeline, intake, _emitter) = build_pipeline(
        StubBehavior::Reply {
            text: "Your order ships in 5-7 days",
            tokens: 30,
            delay_ms: 120,
        },
        StubBehavior::Reply {
            text: GOOD_VERDICT,
            tokens: 25,
            delay_ms: 0,
        },
    );

    let response = pipeline.handle(shipping_request()).await.unwrap();

    assert_eq!(response.answer, "Your order ships in 5-7 days");
    assert_eq!(response.metrics.helpfulness, 0.9);
    assert!(!response.metrics.escalation_needed);
    assert!(response.latency >= 120);
    assert!(!response.request_id.is_empty());

    // One series payload with all nine observations, tagged as shipping
    let payloads = intake.series_payloads.lock().await;
    assert_eq!(payloads.len(), 1);
    let series = &payloads[0];
    assert_eq!(series.len(), 9);
    assert!(series
        .iter()
        .all(|s| s.tags.contains(&"issue_type:shipping".to_string())));

    let tokens_total = series
        .iter()
        .find(|s| s.metric == "supportbot.tokens.total")
        .expect("tokens.total series present");
    assert_eq!(tokens_total.points[0].value, 55.0);

    let escalation = series
        .iter()
        .find(|s| s.metric == "supportbot.escalation.needed")
        .expect("escalation series present");
    assert_eq!(escalation.points[0].value, 0.0);

    // One log record carrying the full request context
    let logs = intake.log_payloads.lock().await;
    assert_eq!(logs.len(), 1);
    let record = &logs[0][0];
    assert_eq!(record["message"], "Chat completed");
    assert_eq!(record["issueType"], "shipping");
    assert_eq!(record["userId"], "u1");
    assert_eq!(record["evaluation"]["helpfulness"], 0.9);
    assert_eq!(record["requestId"], response.request_id);
}

#[tokio::test]
async fn evaluator_failure_still_delivers_the_answer() {
    let (pipeline, intake, _emitter) = build_pipeline(
        StubBehavior::Reply {
            text: "Your order ships in 5-7 days",
            tokens: 30,
            delay_ms: 0,
        },
        StubBehavior::Fail,
    );

    let response = pipeline.handle(shipping_request()).await.unwrap();

    assert_eq!(response.answer, "Your order ships in 5-7 days");
    assert_eq!(response.metrics.helpfulness, 0.5);
    assert!(response.metrics.escalation_needed);

    // The degraded verdict still produces the full telemetry set
    let payloads = intake.series_payloads.lock().await;
    assert_eq!(payloads.len(), 1);
    let escalation = payloads[0]
        .iter()
        .find(|s| s.metric == "supportbot.escalation.needed")
        .expect("escalation series present");
    assert_eq!(escalation.points[0].value, 1.0);
}

#[tokio::test]
async fn malformed_verdict_degrades_but_succeeds() {
    let (pipeline, _intake, _emitter) = build_pipeline(
        StubBehavior::Reply {
            text: "the answer",
            tokens: 10,
            delay_ms: 0,
        },
        StubBehavior::Reply {
            text: "not a json verdict",
            tokens: 5,
            delay_ms: 0,
        },
    );

    let response = pipeline.handle(shipping_request()).await.unwrap();
    assert!(response.metrics.escalation_needed);
    assert_eq!(response.metrics.helpfulness, 0.5);
}

#[tokio::test]
async fn generation_failure_short_circuits_all_telemetry() {
    let (pipeline, intake, emitter) = build_pipeline(
        StubBehavior::Fail,
        StubBehavior::Reply {
            text: GOOD_VERDICT,
            tokens: 25,
            delay_ms: 0,
        },
    );

    let result = pipeline.handle(shipping_request()).await;
    let err = result.expect_err("generation failure must fail the request");
    assert!(matches!(err.source, LlmError::ServerError(_)));
    assert!(!err.request_id.is_empty());

    // No observations appended, nothing shipped, no log record
    assert_eq!(emitter.pending().await, 0);
    assert!(intake.series_payloads.lock().await.is_empty());
    assert!(intake.log_payloads.lock().await.is_empty());
}

#[tokio::test]
async fn correlation_ids_are_unique_per_request() {
    let (pipeline, _intake, _emitter) = build_pipeline(
        StubBehavior::Reply {
            text: "hi",
            tokens: 1,
            delay_ms: 0,
        },
        StubBehavior::Reply {
            text: GOOD_VERDICT,
            tokens: 1,
            delay_ms: 0,
        },
    );

    let first = pipeline.handle(shipping_request()).await.unwrap();
    let second = pipeline.handle(shipping_request()).await.unwrap();
    assert_ne!(first.request_id, second.request_id);
}

#[tokio::test]
async fn billing_question_is_tagged_billing() {
    let (pipeline, intake, _emitter) = build_pipeline(
        StubBehavior::Reply {
            text: "Refunds take 3-5 days",
            tokens: 12,
            delay_ms: 0,
        },
        StubBehavior::Reply {
            text: GOOD_VERDICT,
            tokens: 8,
            delay_ms: 0,
        },
    );

    let request = ChatRequest {
        user_id: "u2".to_string(),
        question: "When will I get my refund?".to_string(),
    };
    pipeline.handle(request).await.unwrap();

    let payloads = intake.series_payloads.lock().await;
    assert!(payloads[0]
        .iter()
        .all(|s| s.tags.contains(&"issue_type:billing".to_string())));
}

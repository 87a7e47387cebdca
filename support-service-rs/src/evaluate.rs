// support-service-rs/src/evaluate.rs
// Automated quality grading of generated answers

use std::sync::Arc;
use std::time::Instant;

use crate::llm_client::ChatModel;
use crate::prompts::EVALUATOR_PROMPT;
use crate::types::{Evaluation, Verdict};

/// Grades a question/answer pair against the fixed rubric
///
/// Failure policy differs from generation: this component never fails.
/// Any error - remote failure, non-JSON reply, missing fields - becomes a
/// degraded verdict, so an evaluation outage can never block delivery of
/// the generated answer.
pub struct AnswerEvaluator {
    model: Arc<dyn ChatModel>,
}

impl AnswerEvaluator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Evaluate one answer. Latency on the failure path is measured up to
    /// the point of failure, not a full timeout duration.
    pub async fn evaluate(&self, question: &str, answer: &str) -> Evaluation {
        let start = Instant::now();
        let prompt = format!(
            "Question: {}\nAnswer: {}\nEvaluate this support response.",
            question, answer
        );

        let reply = match self.model.complete(EVALUATOR_PROMPT, &prompt, true).await {
            Ok(reply) => reply,
            Err(err) => {
                log::error!("Evaluation failed: {}", err);
                return Evaluation {
                    verdict: Verdict::degraded(),
                    latency_ms: start.elapsed().as_millis() as u64,
                    tokens: 0,
                };
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;

        match serde_json::from_str::<Verdict>(&reply.text) {
            Ok(verdict) => {
                let verdict = verdict.clamped();
                log::info!(
                    "Evaluation complete: latency_ms={}, helpfulness={}",
                    latency_ms,
                    verdict.helpfulness
                );
                Evaluation {
                    verdict,
                    latency_ms,
                    tokens: reply.tokens,
                }
            }
            Err(err) => {
                log::error!("Evaluation verdict did not parse: {}", err);
                Evaluation {
                    verdict: Verdict::degraded(),
                    latency_ms,
                    tokens: 0,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{LlmError, MockChatModel, ModelReply};

    fn verdict_reply(json: &str, tokens: u32) -> ModelReply {
        ModelReply {
            text: json.to_string(),
            tokens,
        }
    }

    #[tokio::test]
    async fn well_formed_verdict_is_parsed_and_kept() {
        let mut model = MockChatModel::new();
        model.expect_complete().returning(|_, _, _| {
            Ok(verdict_reply(
                r#"{"helpfulness":0.9,"safety":1.0,"hallucinationRisk":0.1,"escalationNeeded":false,"comment":"clear"}"#,
                25,
            ))
        });

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        let evaluation = evaluator.evaluate("q", "a").await;

        assert_eq!(evaluation.verdict.helpfulness, 0.9);
        assert!(!evaluation.verdict.escalation_needed);
        assert_eq!(evaluation.tokens, 25);
    }

    #[tokio::test]
    async fn remote_failure_becomes_degraded_verdict() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _, _| Err(LlmError::NetworkError("down".to_string())));

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        let evaluation = evaluator.evaluate("q", "a").await;

        assert_eq!(evaluation.verdict.helpfulness, 0.5);
        assert_eq!(evaluation.verdict.safety, 0.5);
        assert_eq!(evaluation.verdict.hallucination_risk, 0.5);
        assert!(evaluation.verdict.escalation_needed);
        assert_eq!(evaluation.tokens, 0);
    }

    #[tokio::test]
    async fn non_json_reply_becomes_degraded_verdict() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _, _| Ok(verdict_reply("I'd rate this an 8/10", 12)));

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        let evaluation = evaluator.evaluate("q", "a").await;

        assert!(evaluation.verdict.escalation_needed);
        assert_eq!(evaluation.tokens, 0);
    }

    #[tokio::test]
    async fn verdict_missing_required_fields_becomes_degraded() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _, _| Ok(verdict_reply(r#"{"helpfulness":0.9}"#, 12)));

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        let evaluation = evaluator.evaluate("q", "a").await;

        assert_eq!(evaluation.verdict.helpfulness, 0.5);
        assert!(evaluation.verdict.escalation_needed);
    }

    #[tokio::test]
    async fn out_of_range_scores_are_clamped_not_rejected() {
        let mut model = MockChatModel::new();
        model.expect_complete().returning(|_, _, _| {
            Ok(verdict_reply(
                r#"{"helpfulness":1.8,"safety":-0.4,"hallucinationRisk":0.2,"escalationNeeded":false,"comment":"odd"}"#,
                10,
            ))
        });

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        let evaluation = evaluator.evaluate("q", "a").await;

        assert_eq!(evaluation.verdict.helpfulness, 1.0);
        assert_eq!(evaluation.verdict.safety, 0.0);
        assert!(!evaluation.verdict.escalation_needed);
    }

    #[tokio::test]
    async fn evaluator_requests_json_output() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .withf(|system, user, json_output| {
                system.contains("QA evaluator") && user.contains("Question: q") && *json_output
            })
            .returning(|_, _, _| Err(LlmError::ServerError("n/a".to_string())));

        let evaluator = AnswerEvaluator::new(Arc::new(model));
        evaluator.evaluate("q", "a").await;
    }
}

// support-service-rs/src/types.rs
// Request, response and quality-signal types for the support pipeline

use std::fmt;

use serde::{Deserialize, Serialize};

/// Inbound chat request, one per call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_id: String,
    pub question: String,
}

/// Success payload returned to the client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    pub request_id: String,
    pub metrics: Verdict,
    pub latency: u64,
}

/// Coarse issue category derived from the question text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Billing,
    Tech,
    Shipping,
    Account,
    Other,
}

impl IssueType {
    /// Tag form used in metrics and logs
    pub fn as_tag(&self) -> &'static str {
        match self {
            IssueType::Billing => "billing",
            IssueType::Tech => "tech",
            IssueType::Shipping => "shipping",
            IssueType::Account => "account",
            IssueType::Other => "other",
        }
    }
}

impl fmt::Display for IssueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Result of one answer generation
#[derive(Debug, Clone)]
pub struct AnswerResult {
    pub answer: String,
    pub latency_ms: u64,
    pub tokens: u32,
}

/// Quality verdict produced by the evaluator model
///
/// Score fields are probabilities in [0, 1]; model output outside that
/// range is clamped rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub helpfulness: f64,
    pub safety: f64,
    pub hallucination_risk: f64,
    pub escalation_needed: bool,
    pub comment: String,
}

impl Verdict {
    /// Neutral, escalation-flagged verdict substituted when real evaluation
    /// cannot be obtained. Shows up in monitoring as a red flag instead of
    /// silently dropping the quality signal.
    pub fn degraded() -> Self {
        Self {
            helpfulness: 0.5,
            safety: 0.5,
            hallucination_risk: 0.5,
            escalation_needed: true,
            comment: "Evaluation failed".to_string(),
        }
    }

    /// Clamp all score fields into [0, 1]
    pub fn clamped(mut self) -> Self {
        self.helpfulness = self.helpfulness.clamp(0.0, 1.0);
        self.safety = self.safety.clamp(0.0, 1.0);
        self.hallucination_risk = self.hallucination_risk.clamp(0.0, 1.0);
        self
    }
}

/// Evaluation outcome: always present, possibly degraded
///
/// Unlike generation there is no error variant here; an evaluation that
/// could not be obtained becomes a degraded verdict instead.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub verdict: Verdict,
    pub latency_ms: u64,
    pub tokens: u32,
}

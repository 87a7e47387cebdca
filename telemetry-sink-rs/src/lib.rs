//! # Telemetry Sink - Metric Batching and Log Shipping
//!
//! Buffers metric observations in memory and batch-ships them to the
//! observability intake API, plus one-shot structured log records.
//! Delivery is best-effort and at-most-once: a failed batch is logged
//! locally and never re-queued.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use config_rs::SinkConfig;

/// Canonical prefix applied to every metric name
pub const METRIC_PREFIX: &str = "supportbot.";

/// Service identity tag prepended to every observation
pub const SERVICE_TAG: &str = "service:supportbot";

const LOG_SOURCE: &str = "rust";
const LOG_SERVICE: &str = "supportbot";

// Intake v2 series type encoding
const SERIES_TYPE_COUNT: u8 = 1;
const SERIES_TYPE_GAUGE: u8 = 3;

/// Metric observation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Count,
    Gauge,
}

impl MetricKind {
    fn series_type(self) -> u8 {
        match self {
            MetricKind::Count => SERIES_TYPE_COUNT,
            MetricKind::Gauge => SERIES_TYPE_GAUGE,
        }
    }
}

/// One point of a metric series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// One buffered observation, in the intake v2 series shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSeries {
    pub metric: String,
    #[serde(rename = "type")]
    pub series_type: u8,
    pub points: Vec<MetricPoint>,
    pub tags: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("intake returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Transport to the remote intake endpoints
///
/// The production implementation POSTs to the hosted API; tests substitute
/// a recording transport to observe exactly what would have been shipped.
#[async_trait]
pub trait IntakeTransport: Send + Sync {
    async fn send_series(&self, series: &[MetricSeries]) -> Result<(), SinkError>;
    async fn send_logs(&self, records: &[Value]) -> Result<(), SinkError>;
}

/// HTTP transport to the hosted metrics/logs intake API
pub struct DatadogIntake {
    http_client: reqwest::Client,
    api_key: String,
    series_url: String,
    logs_url: String,
}

impl DatadogIntake {
    pub fn new(api_key: String, site: &str) -> Result<Self, SinkError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SinkError::Http(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key,
            series_url: format!("https://api.{}/api/v2/series", site),
            logs_url: format!("https://http-intake.logs.{}/api/v2/logs", site),
        })
    }

    async fn post(&self, url: &str, body: &Value) -> Result<(), SinkError> {
        let response = self
            .http_client
            .post(url)
            .header("DD-API-KEY", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| SinkError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl IntakeTransport for DatadogIntake {
    async fn send_series(&self, series: &[MetricSeries]) -> Result<(), SinkError> {
        self.post(&self.series_url, &json!({ "series": series })).await
    }

    async fn send_logs(&self, records: &[Value]) -> Result<(), SinkError> {
        self.post(&self.logs_url, &json!(records)).await
    }
}

/// Accumulates metric observations and ships them in batches
///
/// The batch behind the mutex is the only shared mutable state in the
/// pipeline. `flush` swaps the batch out under the lock, so observations
/// appended while a send is in flight land in the next batch - nothing is
/// lost and nothing is sent twice.
pub struct MetricsEmitter {
    environment_tag: String,
    batch: Mutex<Vec<MetricSeries>>,
    transport: Option<Arc<dyn IntakeTransport>>,
    hostname: String,
}

impl MetricsEmitter {
    /// Build an emitter from the sink configuration. Without a credential
    /// the transport stays unset and every send is a no-op.
    pub fn new(config: &SinkConfig) -> Result<Self, SinkError> {
        let transport = match &config.api_key {
            Some(key) => {
                let intake = DatadogIntake::new(key.clone(), &config.site)?;
                Some(Arc::new(intake) as Arc<dyn IntakeTransport>)
            }
            None => None,
        };

        Ok(Self::with_transport(&config.environment, transport))
    }

    /// Build an emitter over an explicit transport (or none, disabling sends)
    pub fn with_transport(
        environment: &str,
        transport: Option<Arc<dyn IntakeTransport>>,
    ) -> Self {
        let hostname =
            std::env::var("HOSTNAME").unwrap_or_else(|_| "support-service".to_string());

        Self {
            environment_tag: format!("env:{}", environment),
            batch: Mutex::new(Vec::new()),
            transport,
            hostname,
        }
    }

    /// Append a gauge observation to the batch
    pub async fn gauge(&self, name: &str, value: f64, tags: &[String]) {
        self.push(MetricKind::Gauge, name, value, tags).await;
    }

    /// Append a count observation to the batch
    pub async fn count(&self, name: &str, value: f64, tags: &[String]) {
        self.push(MetricKind::Count, name, value, tags).await;
    }

    async fn push(&self, kind: MetricKind, name: &str, value: f64, tags: &[String]) {
        let mut all_tags = Vec::with_capacity(tags.len() + 2);
        all_tags.push(self.environment_tag.clone());
        all_tags.push(SERVICE_TAG.to_string());
        all_tags.extend(tags.iter().cloned());

        let series = MetricSeries {
            metric: format!("{}{}", METRIC_PREFIX, name),
            series_type: kind.series_type(),
            points: vec![MetricPoint {
                timestamp: Utc::now().timestamp(),
                value,
            }],
            tags: all_tags,
        };

        self.batch.lock().await.push(series);
    }

    /// Ship the current batch as one payload, best-effort
    ///
    /// No-op when the batch is empty or no credential is configured. A
    /// rejected or failed send is logged and the batch is dropped, never
    /// re-queued.
    pub async fn flush(&self) {
        let transport = match &self.transport {
            Some(t) => t,
            None => return,
        };

        let batch = {
            let mut guard = self.batch.lock().await;
            if guard.is_empty() {
                return;
            }
            std::mem::take(&mut *guard)
        };

        match transport.send_series(&batch).await {
            Ok(()) => log::debug!("Shipped {} metric series", batch.len()),
            Err(e) => log::error!("Failed to ship metrics batch: {}", e),
        }
    }

    /// Ship one structured log record, best-effort
    ///
    /// The record is wrapped with the source/service/hostname envelope the
    /// logs intake expects. Silent no-op without a credential.
    pub async fn send_log(&self, record: Value) {
        let transport = match &self.transport {
            Some(t) => t,
            None => return,
        };

        let mut record = record;
        if let Value::Object(fields) = &mut record {
            fields.insert("ddsource".to_string(), json!(LOG_SOURCE));
            fields.insert("service".to_string(), json!(LOG_SERVICE));
            fields.insert("hostname".to_string(), json!(self.hostname));
        }

        if let Err(e) = transport.send_logs(std::slice::from_ref(&record)).await {
            log::error!("Failed to ship log record: {}", e);
        }
    }

    /// Number of buffered observations (diagnostic)
    pub async fn pending(&self) -> usize {
        self.batch.lock().await.len()
    }
}

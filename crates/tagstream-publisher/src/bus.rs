//! Kafka bus connection and batch publishing.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex;

use tagstream_core::RunSummary;

use crate::envelope::Envelope;

const SEND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
    #[error("message bus is not configured")]
    Disabled,
}

/// Outcome of one publish pass, mirrored into the run artifacts.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PublishReport {
    pub success: bool,
    pub sent: usize,
}

/// Broker settings read from `KAFKA_*` environment variables.
///
/// The bus is optional: when brokers or SASL credentials are missing the
/// publisher stays disabled and results are only persisted locally.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub bootstrap_servers: String,
    pub api_key: String,
    pub api_secret: String,
    pub topic: String,
}

impl BusConfig {
    /// Read broker settings from the process environment. Returns `None`
    /// when the bus is not configured.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::build(|var| std::env::var(var).ok())
    }

    fn build(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let config = Self {
            bootstrap_servers: non_empty("KAFKA_BOOTSTRAP_SERVERS")?,
            api_key: non_empty("KAFKA_API_KEY")?,
            api_secret: non_empty("KAFKA_API_SECRET")?,
            topic: non_empty("KAFKA_TOPIC").unwrap_or_else(|| "market-stream".to_string()),
        };
        Some(config)
    }
}

/// Publisher with lazy, idempotent connection handling.
pub struct BusPublisher {
    config: Option<BusConfig>,
    producer: Mutex<Option<FutureProducer>>,
}

impl BusPublisher {
    /// Build a publisher; `config: None` yields a disabled bus whose
    /// publishes are no-ops.
    #[must_use]
    pub fn new(config: Option<BusConfig>) -> Self {
        if config.is_none() {
            tracing::warn!("message bus not configured, results will only be saved locally");
        }
        Self {
            config,
            producer: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Ensure a live producer exists. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::Disabled`] without configuration, or
    /// [`PublishError::Kafka`] when the producer cannot be created.
    pub async fn connect(&self) -> Result<(), PublishError> {
        let Some(config) = &self.config else {
            return Err(PublishError::Disabled);
        };
        let mut guard = self.producer.lock().await;
        if guard.is_some() {
            return Ok(());
        }

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("security.protocol", "SASL_SSL")
            .set("sasl.mechanisms", "PLAIN")
            .set("sasl.username", &config.api_key)
            .set("sasl.password", &config.api_secret)
            .set("message.timeout.ms", "30000")
            .create()?;
        tracing::info!(topic = %config.topic, "message bus connected");
        *guard = Some(producer);
        Ok(())
    }

    /// Drop the producer, flushing buffered messages. Idempotent.
    pub async fn disconnect(&self) {
        let mut guard = self.producer.lock().await;
        if guard.take().is_some() {
            tracing::info!("message bus disconnected");
        }
    }

    /// Publish every record of a run, one batch per (platform, tag) pair,
    /// keyed by tag. Platforms that failed and tags with no records are
    /// skipped. A failing batch is logged and skipped; the remaining
    /// batches still go out.
    ///
    /// Never errors: a disabled or unreachable bus reports
    /// `{success: false, sent: 0}` so the caller can continue with local
    /// persistence.
    pub async fn publish_summary(&self, summary: &RunSummary) -> PublishReport {
        if !self.is_enabled() {
            tracing::debug!("message bus disabled, skipping publish");
            return PublishReport {
                success: false,
                sent: 0,
            };
        }
        if let Err(error) = self.connect().await {
            tracing::error!(error = %error, "message bus connection failed");
            return PublishReport {
                success: false,
                sent: 0,
            };
        }

        let guard = self.producer.lock().await;
        let Some(producer) = guard.as_ref() else {
            return PublishReport {
                success: false,
                sent: 0,
            };
        };
        let topic = self.config.as_ref().map_or("", |c| c.topic.as_str());

        let crawled_at = chrono::Utc::now();
        let mut sent = 0;
        for (platform, tag, records) in publishable_batches(summary) {
            match send_batch(producer, topic, tag, records, crawled_at).await {
                Ok(count) => sent += count,
                Err(error) => {
                    tracing::warn!(
                        platform = %platform,
                        tag = %tag,
                        error = %error,
                        "batch publish failed, skipping"
                    );
                }
            }
        }

        tracing::info!(sent, topic = %topic, "run published");
        PublishReport {
            success: true,
            sent,
        }
    }
}

/// The (platform, tag, records) batches a run yields: successful platforms
/// only, non-empty tags only.
fn publishable_batches(
    summary: &RunSummary,
) -> impl Iterator<Item = (tagstream_core::Platform, &str, &[tagstream_core::ContentRecord])> {
    summary
        .platforms
        .values()
        .filter(|outcome| outcome.success)
        .flat_map(|outcome| {
            outcome
                .data
                .iter()
                .filter(|(_, records)| !records.is_empty())
                .map(|(tag, records)| (outcome.platform, tag.as_str(), records.as_slice()))
        })
}

/// Wire envelopes for one (tag, records) batch.
fn batch_envelopes(
    tag: &str,
    records: &[tagstream_core::ContentRecord],
    crawled_at: chrono::DateTime<chrono::Utc>,
) -> Vec<Envelope> {
    records
        .iter()
        .map(|record| Envelope::from_record(record, tag, crawled_at))
        .collect()
}

async fn send_batch(
    producer: &FutureProducer,
    topic: &str,
    tag: &str,
    records: &[tagstream_core::ContentRecord],
    crawled_at: chrono::DateTime<chrono::Utc>,
) -> Result<usize, PublishError> {
    let mut sent = 0;
    for envelope in batch_envelopes(tag, records, crawled_at) {
        let payload = match serde_json::to_vec(&envelope) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(error = %error, "envelope serialization failed, dropping message");
                continue;
            }
        };
        producer
            .send(
                FutureRecord::to(topic).key(tag).payload(&payload),
                Timeout::After(SEND_TIMEOUT),
            )
            .await
            .map_err(|(error, _)| PublishError::Kafka(error))?;
        sent += 1;
    }
    Ok(sent)
}

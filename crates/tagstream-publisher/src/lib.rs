//! Kafka publishing for crawl results.
//!
//! Converts the canonical run summary into flat wire envelopes and pushes
//! them to a Kafka topic in per-(platform, tag) batches. The bus degrades
//! gracefully: without broker configuration the publisher is disabled and
//! every publish is a no-op, so runs still complete and persist locally.

pub mod bus;
pub mod envelope;

pub use bus::{BusConfig, BusPublisher, PublishError, PublishReport};
pub use envelope::Envelope;

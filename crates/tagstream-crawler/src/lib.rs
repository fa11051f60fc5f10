//! Crawl orchestration for the tagstream pipeline.
//!
//! Drives concurrent per-platform fetches against the upstream aggregation
//! API, retries each (platform, tag) fetch with a fixed delay, normalizes
//! raw items into canonical content records, and aggregates partial
//! successes and failures into a [`tagstream_core::RunSummary`].

pub mod adapters;
pub mod client;
pub mod counter;
pub mod error;
pub mod orchestrator;
pub mod retry;
pub mod store;

mod parse;

pub use adapters::{enabled_adapters, PlatformAdapter};
pub use client::UpstreamClient;
pub use counter::{CallCounter, CallStats};
pub use error::{CrawlError, StoreError};
pub use orchestrator::Crawler;
pub use retry::with_retry;
pub use store::RunStore;

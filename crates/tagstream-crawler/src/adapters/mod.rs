//! Platform adapter contract and the six concrete adapters.
//!
//! Each adapter exposes the same two independently-callable capabilities:
//! a tag search against the upstream aggregation API and a pure
//! normalization from one raw item to a canonical [`ContentRecord`].
//! Keeping them separate lets the orchestrator retry the fetch without
//! re-normalizing and lets normalization be unit-tested against recorded
//! fixtures.

mod instagram;
mod linkedin;
mod reddit;
mod tiktok;
mod twitter;
mod youtube;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use tagstream_core::{ContentRecord, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;

pub use instagram::InstagramAdapter;
pub use linkedin::LinkedinAdapter;
pub use reddit::RedditAdapter;
pub use tiktok::TiktokAdapter;
pub use twitter::TwitterAdapter;
pub use youtube::YoutubeAdapter;

/// Capability contract implemented by every platform variant.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn platform(&self) -> Platform;

    /// Fetch raw search results for one tag.
    ///
    /// Returns the platform's best-effort list of raw items; fewer than
    /// `limit` is normal, and an upstream that ignores `limit` entirely is
    /// tolerated, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Upstream`] when the response envelope carries a
    /// non-success code, or [`CrawlError::Http`] on transport failure.
    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError>;

    /// Pure transform of one raw item into the canonical record shape.
    ///
    /// Performs no I/O and never fails: missing or malformed nested fields
    /// degrade to empty strings, absent stats keys, and a null timestamp.
    fn normalize(&self, raw: &Value) -> ContentRecord;
}

/// Build the adapter set for the given enabled platforms, preserving order.
#[must_use]
pub fn enabled_adapters(platforms: &[Platform]) -> Vec<Arc<dyn PlatformAdapter>> {
    platforms
        .iter()
        .map(|platform| -> Arc<dyn PlatformAdapter> {
            match platform {
                Platform::Tiktok => Arc::new(TiktokAdapter),
                Platform::Instagram => Arc::new(InstagramAdapter),
                Platform::Twitter => Arc::new(TwitterAdapter),
                Platform::Youtube => Arc::new(YoutubeAdapter),
                Platform::Linkedin => Arc::new(LinkedinAdapter),
                Platform::Reddit => Arc::new(RedditAdapter),
            }
        })
        .collect()
}

/// Interpret a JSON value as a unix-seconds timestamp.
pub(crate) fn timestamp_from_unix(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let secs = value?.as_i64()?;
    DateTime::from_timestamp(secs, 0)
}

/// Parse an ISO-8601/RFC-3339 timestamp string.
pub(crate) fn timestamp_from_iso(value: Option<&Value>) -> Option<DateTime<Utc>> {
    let raw = value?.as_str()?;
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

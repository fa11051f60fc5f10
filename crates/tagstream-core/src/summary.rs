use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{ContentRecord, Platform};

/// One tag that failed for a platform after exhausting retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagError {
    pub tag: String,
    pub message: String,
}

/// Result of crawling one platform for all requested tags.
///
/// `success` is false iff at least one tag fetch failed after retries (or
/// the platform task itself failed); records for the tags that did succeed
/// are still present in `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformOutcome {
    pub platform: Platform,
    pub success: bool,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<ContentRecord>>,
    #[serde(default)]
    pub errors: Vec<TagError>,
}

impl PlatformOutcome {
    #[must_use]
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            success: true,
            data: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    /// Outcome for a platform whose task failed wholesale (panic or
    /// cancellation) before producing any per-tag results.
    #[must_use]
    pub fn failed(platform: Platform, message: impl Into<String>) -> Self {
        Self {
            platform,
            success: false,
            data: BTreeMap::new(),
            errors: vec![TagError {
                tag: "*".to_string(),
                message: message.into(),
            }],
        }
    }

    /// Total normalized records across all tags.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }
}

/// Immutable aggregate of one orchestrated crawl run. Built once per run,
/// then handed unchanged to the publisher and the artifact store.
///
/// `platforms` is keyed by [`Platform::key`]; map order is sorted and
/// deliberately independent of task completion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
    pub platforms: BTreeMap<String, PlatformOutcome>,
}

impl RunSummary {
    /// Total normalized records across all platforms and tags.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.platforms.values().map(PlatformOutcome::record_count).sum()
    }
}

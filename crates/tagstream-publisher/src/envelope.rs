//! Wire envelope for one published post.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use tagstream_core::ContentRecord;

/// Flat message shape consumed downstream of the topic.
///
/// Engagement counters are zero-filled here: a record that never carried a
/// given stat publishes `0`, while the canonical record keeps the key
/// absent. Consumers get a fixed schema either way.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub platform: String,
    pub hashtag: String,
    pub tag: String,

    pub post_id: Option<String>,
    pub author: Option<String>,
    pub description: String,
    pub content_url: String,
    pub cover_url: String,

    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub saves: u64,

    pub created_at: Option<DateTime<Utc>>,
    pub crawled_at: DateTime<Utc>,

    pub raw: Value,
}

impl Envelope {
    /// Build the envelope for one record crawled under `tag`.
    #[must_use]
    pub fn from_record(record: &ContentRecord, tag: &str, crawled_at: DateTime<Utc>) -> Self {
        Self {
            kind: "social_post",
            platform: record.platform.key().to_string(),
            hashtag: format!("#{tag}"),
            tag: tag.to_string(),
            post_id: non_empty(&record.id),
            author: non_empty(&record.author.username),
            description: record.content.title.clone(),
            content_url: record.content.url.clone(),
            cover_url: if record.content.thumbnail_url.is_empty() {
                record.content.media_url.clone()
            } else {
                record.content.thumbnail_url.clone()
            },
            views: stat(record, "views", "play_count"),
            likes: stat(record, "likes", "digg_count"),
            comments: stat(record, "comments", "comment_count"),
            shares: stat(record, "shares", "share_count"),
            saves: stat(record, "saves", "collect_count"),
            created_at: record.created_at,
            crawled_at,
            raw: record.raw.clone(),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Resolve one engagement counter with its historical fallbacks: the
/// canonical stats map first, then the raw item's `statistics.<legacy>`
/// nest, then flat `<legacy>` and `<canonical>` top-level fields. Absent
/// everywhere means zero.
fn stat(record: &ContentRecord, canonical: &str, legacy: &str) -> u64 {
    if let Some(count) = record.stats.get(canonical) {
        return *count;
    }
    let raw = &record.raw;
    raw.get("statistics")
        .and_then(|s| s.get(legacy))
        .or_else(|| raw.get(legacy))
        .or_else(|| raw.get(canonical))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

//! Twitter/X adapter: latest-tweet search timeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_array, pick_bool, pick_id, pick_str, pick_u64, value_at};

use super::{timestamp_from_iso, PlatformAdapter};

pub struct TwitterAdapter;

#[async_trait]
impl PlatformAdapter for TwitterAdapter {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/twitter/web/fetch_search_timeline",
                &[
                    ("keyword", format!("#{tag}")),
                    ("search_type", "Latest".to_string()),
                    ("count", limit.to_string()),
                ],
            )
            .await?;
        let data = envelope.into_data()?;
        Ok(pick_array(&data, &[&["timeline"]]).to_vec())
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        let id = pick_id(raw, &[&["tweet_id"]]);
        let screen_name = pick_str(raw, &[&["screen_name"]]);

        let first_media = value_at(raw, &["entities", "media", "0"]);
        let content_type = match first_media {
            Some(media) if pick_str(media, &[&["type"]]) == "video" => ContentType::Video,
            Some(_) => ContentType::Image,
            None => ContentType::Text,
        };

        let media_url = first_media
            .map(|media| {
                if content_type == ContentType::Video {
                    mp4_variant_url(media)
                        .unwrap_or_else(|| pick_str(media, &[&["media_url_https"]]))
                } else {
                    pick_str(media, &[&["media_url_https"]])
                }
            })
            .unwrap_or_default();

        let mut stats = std::collections::BTreeMap::new();
        for (key, field) in [
            ("likes", "favorites"),
            ("comments", "replies"),
            ("retweets", "retweets"),
            ("quotes", "quotes"),
            ("views", "views"),
            ("bookmarks", "bookmarks"),
        ] {
            if let Some(count) = pick_u64(raw, &[&[field]]) {
                stats.insert(key.to_string(), count);
            }
        }

        ContentRecord {
            platform: Platform::Twitter,
            id: id.clone(),
            content_type,
            content: ContentBody {
                title: pick_str(raw, &[&["text"]]),
                url: if id.is_empty() || screen_name.is_empty() {
                    String::new()
                } else {
                    format!("https://x.com/{screen_name}/status/{id}")
                },
                media_url,
                thumbnail_url: first_media
                    .map(|media| pick_str(media, &[&["media_url_https"]]))
                    .unwrap_or_default(),
            },
            author: Author {
                id: pick_id(raw, &[&["user_info", "rest_id"], &["user_id"]]),
                username: screen_name,
                display_name: pick_str(raw, &[&["user_info", "name"]]),
                avatar_url: pick_str(raw, &[&["user_info", "avatar"]]),
                verified: pick_bool(raw, &[&["user_info", "verified"]]),
            },
            stats,
            created_at: parse_created_at(raw.get("created_at")),
            raw: raw.clone(),
        }
    }
}

/// First mp4 variant URL of a video media entity, if any.
fn mp4_variant_url(media: &Value) -> Option<String> {
    let variants = value_at(media, &["video_info", "variants"])?.as_array()?;
    variants
        .iter()
        .find(|v| pick_str(v, &[&["content_type"]]) == "video/mp4")
        .map(|v| pick_str(v, &[&["url"]]))
        .filter(|url| !url.is_empty())
}

/// Tweets carry either RFC-3339 or the classic `Wed Oct 10 20:19:24 +0000
/// 2018` format depending on the endpoint version.
fn parse_created_at(value: Option<&Value>) -> Option<DateTime<Utc>> {
    if let Some(ts) = timestamp_from_iso(value) {
        return Some(ts);
    }
    let raw = value?.as_str()?;
    DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

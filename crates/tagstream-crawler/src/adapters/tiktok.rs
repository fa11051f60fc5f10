//! TikTok adapter: video search by keyword.

use async_trait::async_trait;
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_array, pick_id, pick_str, pick_u64};

use super::{timestamp_from_unix, PlatformAdapter};

pub struct TiktokAdapter;

#[async_trait]
impl PlatformAdapter for TiktokAdapter {
    fn platform(&self) -> Platform {
        Platform::Tiktok
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/tiktok/app/v3/fetch_video_search_result",
                &[
                    ("keyword", tag.to_string()),
                    ("count", limit.to_string()),
                    ("offset", "0".to_string()),
                    ("sort_type", "0".to_string()),
                    ("publish_time", "0".to_string()),
                ],
            )
            .await?;
        let data = envelope.into_data()?;

        // Search results wrap each video in an `aweme_info` field.
        let items = pick_array(&data, &[&["search_item_list"]]);
        Ok(items
            .iter()
            .filter_map(|item| item.get("aweme_info"))
            .filter(|info| !info.is_null())
            .cloned()
            .collect())
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        let id = pick_id(raw, &[&["aweme_id"]]);
        let username = pick_str(raw, &[&["author", "unique_id"]]);

        let mut url = pick_str(raw, &[&["share_url"]]);
        if url.is_empty() && !id.is_empty() && !username.is_empty() {
            url = format!("https://www.tiktok.com/@{username}/video/{id}");
        }

        let mut stats = std::collections::BTreeMap::new();
        for (key, path) in [
            ("likes", "digg_count"),
            ("comments", "comment_count"),
            ("shares", "share_count"),
            ("views", "play_count"),
            ("saves", "collect_count"),
        ] {
            if let Some(count) = pick_u64(raw, &[&["statistics", path]]) {
                stats.insert(key.to_string(), count);
            }
        }

        ContentRecord {
            platform: Platform::Tiktok,
            id,
            content_type: ContentType::Video,
            content: ContentBody {
                title: pick_str(raw, &[&["desc"]]),
                url,
                media_url: pick_str(raw, &[&["video", "play_addr", "url_list", "0"]]),
                thumbnail_url: pick_str(
                    raw,
                    &[
                        &["video", "cover", "url_list", "0"],
                        &["video", "origin_cover", "url_list", "0"],
                    ],
                ),
            },
            author: Author {
                id: pick_id(raw, &[&["author", "uid"]]),
                username,
                display_name: pick_str(raw, &[&["author", "nickname"]]),
                avatar_url: pick_str(raw, &[&["author", "avatar_thumb", "url_list", "0"]]),
                verified: false,
            },
            stats,
            created_at: timestamp_from_unix(raw.get("create_time")),
            raw: raw.clone(),
        }
    }
}

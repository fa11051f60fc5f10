//! YouTube adapter: video search, newest first.

use async_trait::async_trait;
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_array, pick_bool, pick_id, pick_str, pick_u64};

use super::PlatformAdapter;

pub struct YoutubeAdapter;

#[async_trait]
impl PlatformAdapter for YoutubeAdapter {
    fn platform(&self) -> Platform {
        Platform::Youtube
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/youtube/web/search_video",
                &[
                    ("search_query", tag.to_string()),
                    ("order_by", "today".to_string()),
                ],
            )
            .await?;
        let data = envelope.into_data()?;

        // The endpoint has no count parameter; truncate client-side.
        let mut videos = pick_array(&data, &[&["videos"]]).to_vec();
        videos.truncate(limit);
        Ok(videos)
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        let id = pick_id(raw, &[&["video_id"]]);
        let channel_id = pick_id(raw, &[&["channel_id"]]);

        let mut stats = std::collections::BTreeMap::new();
        if let Some(views) = pick_u64(raw, &[&["number_of_views"]]) {
            stats.insert("views".to_string(), views);
        }

        ContentRecord {
            platform: Platform::Youtube,
            id: id.clone(),
            content_type: if pick_bool(raw, &[&["is_live_content"]]) {
                ContentType::Live
            } else {
                ContentType::Video
            },
            content: ContentBody {
                title: pick_str(raw, &[&["title"]]),
                url: if id.is_empty() {
                    String::new()
                } else {
                    format!("https://www.youtube.com/watch?v={id}")
                },
                media_url: String::new(),
                thumbnail_url: pick_str(
                    raw,
                    &[&["thumbnails", "1", "url"], &["thumbnails", "0", "url"]],
                ),
            },
            author: Author {
                id: channel_id.clone(),
                username: channel_id,
                display_name: pick_str(raw, &[&["author"]]),
                avatar_url: String::new(),
                verified: false,
            },
            stats,
            // `published_time` is relative text ("3 hours ago"), not a
            // timestamp; leave creation time unknown.
            created_at: None,
            raw: raw.clone(),
        }
    }
}

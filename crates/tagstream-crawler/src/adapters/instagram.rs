//! Instagram adapter: hashtag post feed.
//!
//! The hashtag endpoint has shipped at least three envelope shapes for the
//! same logical data; `search_by_tag` probes them newest-first.

use async_trait::async_trait;
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_array, pick_bool, pick_id, pick_str, pick_u64, value_at};

use super::{timestamp_from_unix, PlatformAdapter};

pub struct InstagramAdapter;

#[async_trait]
impl PlatformAdapter for InstagramAdapter {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/instagram/v1/fetch_hashtag_posts",
                &[("hashtag", tag.to_string()), ("count", limit.to_string())],
            )
            .await?;
        let data = envelope.into_data()?;

        let edges = pick_array(
            &data,
            &[
                &["data", "hashtag", "edge_hashtag_to_media", "edges"],
                &["hashtag", "edge_hashtag_to_media", "edges"],
                &["edge_hashtag_to_media", "edges"],
                &[],
                &["items"],
            ],
        );
        Ok(edges.to_vec())
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        // Edge-wrapped items carry the post under `node`.
        let item = raw.get("node").unwrap_or(raw);
        let shortcode = pick_str(item, &[&["shortcode"], &["code"]]);

        let content_type = detect_type(item);

        let mut media_url = pick_str(
            item,
            &[
                &["display_url"],
                &["thumbnail_src"],
                &["image_versions2", "candidates", "0", "url"],
            ],
        );
        if content_type == ContentType::Video {
            let video_url = pick_str(item, &[&["video_url"], &["video_versions", "0", "url"]]);
            if !video_url.is_empty() {
                media_url = video_url;
            }
        }

        let mut stats = std::collections::BTreeMap::new();
        let counters: [(&str, &[&[&str]]); 4] = [
            ("likes", &[&["edge_liked_by", "count"], &["like_count"]]),
            (
                "comments",
                &[&["edge_media_to_comment", "count"], &["comment_count"]],
            ),
            ("views", &[&["video_view_count"], &["play_count"]]),
            ("shares", &[&["reshare_count"]]),
        ];
        for (key, paths) in counters {
            if let Some(count) = pick_u64(item, paths) {
                stats.insert(key.to_string(), count);
            }
        }

        let created_at = timestamp_from_unix(item.get("taken_at_timestamp"))
            .or_else(|| timestamp_from_unix(item.get("taken_at")));

        ContentRecord {
            platform: Platform::Instagram,
            id: pick_id(item, &[&["id"], &["pk"]]),
            content_type,
            content: ContentBody {
                title: pick_str(
                    item,
                    &[
                        &["edge_media_to_caption", "edges", "0", "node", "text"],
                        &["caption", "text"],
                    ],
                ),
                url: if shortcode.is_empty() {
                    String::new()
                } else {
                    format!("https://www.instagram.com/p/{shortcode}/")
                },
                media_url,
                thumbnail_url: pick_str(
                    item,
                    &[
                        &["thumbnail_src"],
                        &["display_url"],
                        &["image_versions2", "candidates", "0", "url"],
                    ],
                ),
            },
            author: Author {
                id: pick_id(item, &[&["owner", "id"], &["owner", "pk"], &["user", "id"], &["user", "pk"]]),
                username: pick_str(item, &[&["owner", "username"], &["user", "username"]]),
                display_name: pick_str(item, &[&["owner", "full_name"], &["user", "full_name"]]),
                avatar_url: pick_str(
                    item,
                    &[&["owner", "profile_pic_url"], &["user", "profile_pic_url"]],
                ),
                verified: pick_bool(
                    item,
                    &[&["owner", "is_verified"], &["user", "is_verified"]],
                ),
            },
            stats,
            created_at,
            raw: item.clone(),
        }
    }
}

fn detect_type(item: &Value) -> ContentType {
    let media_type = value_at(item, &["media_type"]).and_then(Value::as_i64);
    if pick_bool(item, &[&["is_video"]])
        || media_type == Some(2)
        || pick_str(item, &[&["product_type"]]) == "clips"
    {
        ContentType::Video
    } else if media_type == Some(8) || item.get("carousel_media").is_some() {
        ContentType::Carousel
    } else {
        ContentType::Image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn edge_fixture() -> Value {
        json!({
            "node": {
                "id": "318",
                "shortcode": "Cxyz",
                "is_video": false,
                "display_url": "https://cdn.example/p.jpg",
                "thumbnail_src": "https://cdn.example/t.jpg",
                "taken_at_timestamp": 1_690_000_000,
                "edge_media_to_caption": {"edges": [{"node": {"text": "sunset"}}]},
                "edge_liked_by": {"count": 33},
                "edge_media_to_comment": {"count": 2},
                "owner": {"id": "9", "username": "ana", "is_verified": true}
            }
        })
    }

    #[test]
    fn normalize_unwraps_edge_node() {
        let record = InstagramAdapter.normalize(&edge_fixture());
        assert_eq!(record.id, "318");
        assert_eq!(record.content_type, ContentType::Image);
        assert_eq!(record.content.title, "sunset");
        assert_eq!(record.content.url, "https://www.instagram.com/p/Cxyz/");
        assert_eq!(record.author.username, "ana");
        assert!(record.author.verified);
        assert_eq!(record.stats["likes"], 33);
        assert_eq!(record.created_at.unwrap().timestamp(), 1_690_000_000);
        // raw keeps the unwrapped item, not the edge wrapper.
        assert_eq!(record.raw["shortcode"], "Cxyz");
    }

    #[test]
    fn normalize_detects_video_and_prefers_video_url() {
        let raw = json!({
            "pk": 77,
            "code": "Cabc",
            "media_type": 2,
            "video_url": "https://cdn.example/v.mp4",
            "display_url": "https://cdn.example/p.jpg",
            "user": {"pk": 5, "username": "leo"}
        });
        let record = InstagramAdapter.normalize(&raw);
        assert_eq!(record.content_type, ContentType::Video);
        assert_eq!(record.content.media_url, "https://cdn.example/v.mp4");
        assert_eq!(record.id, "77");
        assert_eq!(record.author.username, "leo");
    }

    #[test]
    fn normalize_detects_carousel() {
        let raw = json!({"id": "1", "carousel_media": [{}, {}]});
        let record = InstagramAdapter.normalize(&raw);
        assert_eq!(record.content_type, ContentType::Carousel);
    }

    #[test]
    fn normalize_is_total_on_empty_item() {
        let record = InstagramAdapter.normalize(&json!({}));
        assert_eq!(record.content_type, ContentType::Image);
        assert!(record.id.is_empty());
        assert!(record.content.url.is_empty());
        assert!(record.stats.is_empty());
    }
}

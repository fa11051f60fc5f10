//! Reddit adapter: dynamic search, posts only.

use async_trait::async_trait;
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_array, pick_bool, pick_id, pick_str, pick_u64, value_at};

use super::{timestamp_from_iso, PlatformAdapter};

pub struct RedditAdapter;

#[async_trait]
impl PlatformAdapter for RedditAdapter {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/reddit/app/fetch_dynamic_search",
                &[("query", tag.to_string())],
            )
            .await?;
        let data = envelope.into_data()?;

        // Dynamic search interleaves posts with people/subreddit components;
        // keep only SearchPost children.
        let edges = pick_array(&data, &[&["search", "dynamic", "components", "main", "edges"]]);
        let mut posts = Vec::new();
        for edge in edges {
            let children = pick_array(edge, &[&["node", "children"]]);
            for child in children {
                if pick_str(child, &[&["__typename"]]) == "SearchPost" {
                    if let Some(post) = child.get("post") {
                        posts.push(post.clone());
                    }
                }
            }
        }
        posts.truncate(limit);
        Ok(posts)
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        let content_type = if pick_bool(raw, &[&["media", "isGif"]]) {
            ContentType::Gif
        } else if value_at(raw, &["media", "videoInfo"]).is_some() {
            ContentType::Video
        } else {
            ContentType::Post
        };

        let mut stats = std::collections::BTreeMap::new();
        let counters: [(&str, &[&[&str]]); 4] = [
            ("upvotes", &[&["score", "upvotes"]]),
            ("downvotes", &[&["score", "downvotes"]]),
            ("score", &[&["score", "score"]]),
            ("comments", &[&["commentCount"]]),
        ];
        for (key, paths) in counters {
            if let Some(count) = pick_u64(raw, paths) {
                stats.insert(key.to_string(), count);
            }
        }

        ContentRecord {
            platform: Platform::Reddit,
            id: pick_id(raw, &[&["id"]]),
            content_type,
            content: ContentBody {
                title: pick_str(raw, &[&["postTitle"]]),
                url: pick_str(raw, &[&["url"]]),
                media_url: pick_str(raw, &[&["media", "videoInfo", "url"]]),
                thumbnail_url: pick_str(raw, &[&["media", "thumbnail", "url"]]),
            },
            author: Author {
                id: pick_id(raw, &[&["authorInfo", "id"]]),
                username: pick_str(raw, &[&["authorInfo", "name"]]),
                display_name: String::new(),
                avatar_url: pick_str(raw, &[&["authorInfo", "snoovatarIcon", "url"]]),
                verified: false,
            },
            stats,
            created_at: timestamp_from_iso(raw.get("createdAt")),
            raw: raw.clone(),
        }
    }
}

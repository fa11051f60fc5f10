//! LinkedIn adapter.
//!
//! The upstream exposes no post search for LinkedIn; the closest capability
//! is people search, so this adapter emits `profile` records. Disabled in
//! the default platform set for that reason.

use async_trait::async_trait;
use serde_json::Value;

use tagstream_core::{Author, ContentBody, ContentRecord, ContentType, Platform};

use crate::client::UpstreamClient;
use crate::error::CrawlError;
use crate::parse::{pick_id, pick_str, value_at};

use super::PlatformAdapter;

pub struct LinkedinAdapter;

#[async_trait]
impl PlatformAdapter for LinkedinAdapter {
    fn platform(&self) -> Platform {
        Platform::Linkedin
    }

    async fn search_by_tag(
        &self,
        client: &UpstreamClient,
        tag: &str,
        limit: usize,
    ) -> Result<Vec<Value>, CrawlError> {
        let envelope = client
            .get(
                "/api/v1/linkedin/web/search_people",
                &[("keyword", tag.to_string())],
            )
            .await?;
        let data = envelope.into_data()?;

        let mut people = crate::parse::pick_array(&data, &[&["data"]]).to_vec();
        people.truncate(limit);
        Ok(people)
    }

    fn normalize(&self, raw: &Value) -> ContentRecord {
        let id = pick_id(raw, &[&["urn"], &["id"]]);
        let profile_url = pick_str(raw, &[&["url"]]);

        let mut stats = std::collections::BTreeMap::new();
        if let Some(services) = value_at(raw, &["services"]).and_then(Value::as_array) {
            stats.insert("services".to_string(), services.len() as u64);
        }

        ContentRecord {
            platform: Platform::Linkedin,
            id: id.clone(),
            content_type: ContentType::Profile,
            content: ContentBody {
                title: pick_str(raw, &[&["title"]]),
                url: profile_url.clone(),
                media_url: String::new(),
                thumbnail_url: pick_str(raw, &[&["avatar", "0", "url"]]),
            },
            author: Author {
                id,
                username: username_from_profile_url(&profile_url),
                display_name: pick_str(raw, &[&["full_name"]]),
                avatar_url: pick_str(raw, &[&["avatar", "0", "url"]]),
                verified: false,
            },
            stats,
            created_at: None,
            raw: raw.clone(),
        }
    }
}

/// Extract the public handle from a profile URL like
/// `https://www.linkedin.com/in/jane-doe/`.
fn username_from_profile_url(url: &str) -> String {
    url.split_once("/in/")
        .map(|(_, rest)| rest.trim_end_matches('/').to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture() -> Value {
        json!({
            "urn": "urn:li:member:88",
            "full_name": "Jane Doe",
            "title": "Audio engineer",
            "url": "https://www.linkedin.com/in/jane-doe/",
            "location": "Berlin",
            "avatar": [{"url": "https://cdn.example/jane.jpg"}],
            "services": [{"name": "mixing"}, {"name": "mastering"}]
        })
    }

    #[test]
    fn normalize_maps_profile() {
        let record = LinkedinAdapter.normalize(&fixture());
        assert_eq!(record.id, "urn:li:member:88");
        assert_eq!(record.content_type, ContentType::Profile);
        assert_eq!(record.content.title, "Audio engineer");
        assert_eq!(record.author.username, "jane-doe");
        assert_eq!(record.author.display_name, "Jane Doe");
        assert_eq!(record.stats["services"], 2);
    }

    #[test]
    fn normalize_missing_id_defaults_to_empty() {
        let record = LinkedinAdapter.normalize(&json!({"full_name": "Anon"}));
        assert!(record.id.is_empty());
        assert_eq!(record.author.display_name, "Anon");
    }

    #[test]
    fn normalize_is_total_on_empty_item() {
        let record = LinkedinAdapter.normalize(&json!({}));
        assert_eq!(record.content_type, ContentType::Profile);
        assert!(record.stats.is_empty());
        assert!(record.author.username.is_empty());
    }

    #[test]
    fn username_extraction_handles_non_profile_urls() {
        assert_eq!(username_from_profile_url("https://example.com/x"), "");
        assert_eq!(
            username_from_profile_url("https://www.linkedin.com/in/jo"),
            "jo"
        );
    }
}

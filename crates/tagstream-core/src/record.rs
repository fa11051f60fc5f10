use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Source platform of a crawled item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Tiktok,
    Instagram,
    Twitter,
    Youtube,
    Linkedin,
    Reddit,
}

impl Platform {
    /// All platforms the pipeline knows about, in configuration order.
    pub const ALL: [Platform; 6] = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Twitter,
        Platform::Youtube,
        Platform::Linkedin,
        Platform::Reddit,
    ];

    /// Stable lowercase key used in summaries, artifacts, and envelopes.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Youtube => "youtube",
            Platform::Linkedin => "linkedin",
            Platform::Reddit => "reddit",
        }
    }

    /// Human-readable name for logs and status reports.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Twitter => "Twitter/X",
            Platform::Youtube => "YouTube",
            Platform::Linkedin => "LinkedIn",
            Platform::Reddit => "Reddit",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "twitter" => Ok(Platform::Twitter),
            "youtube" => Ok(Platform::Youtube),
            "linkedin" => Ok(Platform::Linkedin),
            "reddit" => Ok(Platform::Reddit),
            other => Err(format!("unknown platform: {other}")),
        }
    }
}

/// Kind of content a record represents. Each adapter emits a subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Image,
    Carousel,
    Post,
    Profile,
    Live,
    Text,
    Gif,
}

/// Title/URL block of a canonical record. Missing upstream fields stay
/// empty strings rather than failing normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBody {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub media_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub verified: bool,
}

/// The platform-independent normalized representation of one crawled item.
///
/// `stats` carries only the counters the platform actually reported; absent
/// keys stay absent here and are zero-filled at publish time, so downstream
/// consumers of the canonical record can still tell absence from zero.
/// `raw` retains the untouched upstream item for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub platform: Platform,
    #[serde(default)]
    pub id: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub content: ContentBody,
    #[serde(default)]
    pub author: Author,
    #[serde(default)]
    pub stats: BTreeMap<String, u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_key() {
        for platform in Platform::ALL {
            assert_eq!(platform.key().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn platform_from_str_is_case_insensitive() {
        assert_eq!("TikTok".parse::<Platform>().unwrap(), Platform::Tiktok);
        assert_eq!(" reddit ".parse::<Platform>().unwrap(), Platform::Reddit);
    }

    #[test]
    fn platform_from_str_rejects_unknown() {
        assert!("myspace".parse::<Platform>().is_err());
    }

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let record = ContentRecord {
            platform: Platform::Tiktok,
            id: "123".to_string(),
            content_type: ContentType::Video,
            content: ContentBody {
                title: "clip".to_string(),
                ..ContentBody::default()
            },
            author: Author::default(),
            stats: BTreeMap::from([("likes".to_string(), 7)]),
            created_at: None,
            raw: serde_json::json!({"aweme_id": "123"}),
        };

        let json = serde_json::to_value(&record).expect("serialize record");
        assert_eq!(json["platform"], "tiktok");
        assert_eq!(json["contentType"], "video");
        assert_eq!(json["content"]["title"], "clip");
        assert_eq!(json["stats"]["likes"], 7);
        assert!(json["createdAt"].is_null());
        assert_eq!(json["raw"]["aweme_id"], "123");
    }

    #[test]
    fn record_deserializes_with_missing_optional_blocks() {
        let json = serde_json::json!({
            "platform": "reddit",
            "id": "t3_abc",
            "contentType": "post"
        });
        let record: ContentRecord = serde_json::from_value(json).expect("deserialize");
        assert_eq!(record.platform, Platform::Reddit);
        assert!(record.content.title.is_empty());
        assert!(record.stats.is_empty());
        assert!(record.created_at.is_none());
    }
}

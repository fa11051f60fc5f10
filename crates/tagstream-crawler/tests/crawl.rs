//! Integration tests for the crawl orchestrator and upstream client.
//!
//! Uses `wiremock` to stand up a local upstream aggregation API for each
//! test. Covers envelope handling (both success code conventions), retry
//! exhaustion, partial-failure isolation within and across platforms, and
//! the single-flight run guard.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tagstream_core::{AppConfig, Platform};
use tagstream_crawler::adapters::{RedditAdapter, TiktokAdapter, YoutubeAdapter};
use tagstream_crawler::{
    enabled_adapters, CallCounter, CrawlError, Crawler, PlatformAdapter, UpstreamClient,
};

fn test_config(tags: &[&str]) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        api_base_url: String::new(),
        api_key: "test-key".to_string(),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        log_level: "warn".to_string(),
        tags: tags.iter().map(ToString::to_string).collect(),
        limit: 5,
        enabled_platforms: vec![Platform::Tiktok, Platform::Youtube],
        request_timeout_secs: 5,
        request_delay_ms: 10,
        max_attempts: 2,
        output_dir: PathBuf::from("./output"),
    })
}

fn test_client(server: &MockServer) -> Arc<UpstreamClient> {
    let counter = Arc::new(CallCounter::new());
    Arc::new(
        UpstreamClient::with_base_url(server.uri(), "test-key".to_string(), 5, counter)
            .expect("failed to build test client"),
    )
}

fn tiktok_item(id: &str) -> serde_json::Value {
    json!({
        "aweme_info": {
            "aweme_id": id,
            "desc": "clip",
            "share_url": format!("https://www.tiktok.com/@u/video/{id}"),
            "statistics": {"digg_count": 10, "play_count": 100},
            "author": {"uid": "9", "unique_id": "u", "nickname": "U"}
        }
    })
}

fn mount_tiktok_success(server_tag: &str, items: Vec<serde_json::Value>) -> Mock {
    Mock::given(method("GET"))
        .and(path("/api/v1/tiktok/app/v3/fetch_video_search_result"))
        .and(query_param("keyword", server_tag))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "code": 200,
            "message": "ok",
            "data": {"search_item_list": items}
        })))
}

// ---------------------------------------------------------------------------
// Envelope handling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_accepts_code_zero_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/reddit/app/fetch_dynamic_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "code": 0,
            "data": {
                "search": {"dynamic": {"components": {"main": {"edges": [
                    {"node": {"children": [
                        {"__typename": "SearchPost", "post": {"id": "t3_1", "postTitle": "hi"}},
                        {"__typename": "SearchPerson"}
                    ]}}
                ]}}}}
            }
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = RedditAdapter
        .search_by_tag(&client, "music", 5)
        .await
        .expect("search should succeed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], "t3_1");
}

#[tokio::test]
async fn search_accepts_code_200_envelope() {
    let server = MockServer::start().await;
    mount_tiktok_success("music", vec![tiktok_item("1"), tiktok_item("2")])
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = TiktokAdapter
        .search_by_tag(&client, "music", 5)
        .await
        .expect("search should succeed");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["aweme_id"], "1");
}

#[tokio::test]
async fn search_surfaces_upstream_error_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/youtube/web/search_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "code": 429,
            "message": "rate limited",
            "data": null
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let err = YoutubeAdapter
        .search_by_tag(&client, "music", 5)
        .await
        .expect_err("non-success code must error");
    match err {
        CrawlError::Upstream { code, message } => {
            assert_eq!(code, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("expected Upstream, got: {other:?}"),
    }
}

#[tokio::test]
async fn search_limit_is_applied_client_side_for_youtube() {
    let server = MockServer::start().await;
    let videos: Vec<_> = (0..10)
        .map(|i| json!({"video_id": format!("v{i}"), "title": "t"}))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v1/youtube/web/search_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "code": 200,
            "data": {"videos": videos}
        })))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let items = YoutubeAdapter
        .search_by_tag(&client, "music", 3)
        .await
        .expect("search should succeed");
    assert_eq!(items.len(), 3);
}

// ---------------------------------------------------------------------------
// Call counting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn counter_tracks_success_and_failure() {
    let server = MockServer::start().await;
    mount_tiktok_success("music", vec![]).mount(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/youtube/web/search_video"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server);
    TiktokAdapter
        .search_by_tag(&client, "music", 5)
        .await
        .expect("tiktok call should succeed");
    YoutubeAdapter
        .search_by_tag(&client, "music", 5)
        .await
        .expect_err("http 500 must error");

    let stats = client.counter().snapshot();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 1);
}

// ---------------------------------------------------------------------------
// Orchestrated runs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_once_aggregates_partial_failure_across_platforms() {
    let server = MockServer::start().await;
    mount_tiktok_success("music", vec![tiktok_item("1"), tiktok_item("2")])
        .mount(&server)
        .await;
    // YouTube fails every attempt.
    Mock::given(method("GET"))
        .and(path("/api/v1/youtube/web/search_video"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&json!({
            "code": 500,
            "message": "backend down",
            "data": null
        })))
        .mount(&server)
        .await;

    let config = test_config(&["music"]);
    let crawler = Crawler::with_client(
        Arc::clone(&config),
        test_client(&server),
        enabled_adapters(&config.enabled_platforms),
    );

    let summary = crawler.run_once(None).await.expect("run should complete");
    assert_eq!(summary.tags, vec!["music".to_string()]);

    let tiktok = &summary.platforms["tiktok"];
    assert!(tiktok.success);
    assert_eq!(tiktok.data["music"].len(), 2);
    assert_eq!(tiktok.data["music"][0].id, "1");

    let youtube = &summary.platforms["youtube"];
    assert!(!youtube.success);
    assert_eq!(youtube.errors.len(), 1);
    assert_eq!(youtube.errors[0].tag, "music");
    assert!(youtube.errors[0].message.contains("backend down"));
}

#[tokio::test]
async fn run_once_isolates_failing_tag_within_a_platform() {
    let server = MockServer::start().await;
    mount_tiktok_success("music", vec![tiktok_item("1")])
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tiktok/app/v3/fetch_video_search_result"))
        .and(query_param("keyword", "dance"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = test_config(&["music", "dance"]);
    Arc::get_mut(&mut config).unwrap().enabled_platforms = vec![Platform::Tiktok];
    let crawler = Crawler::with_client(
        Arc::clone(&config),
        test_client(&server),
        enabled_adapters(&config.enabled_platforms),
    );

    let summary = crawler.run_once(None).await.expect("run should complete");
    let tiktok = &summary.platforms["tiktok"];
    assert!(!tiktok.success);
    assert_eq!(tiktok.data["music"].len(), 1);
    assert!(!tiktok.data.contains_key("dance"));
    assert_eq!(tiktok.errors.len(), 1);
    assert_eq!(tiktok.errors[0].tag, "dance");
}

#[tokio::test]
async fn run_once_retries_before_recording_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tiktok/app/v3/fetch_video_search_result"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2) // max_attempts from test_config
        .mount(&server)
        .await;

    let mut config = test_config(&["music"]);
    Arc::get_mut(&mut config).unwrap().enabled_platforms = vec![Platform::Tiktok];
    let crawler = Crawler::with_client(
        Arc::clone(&config),
        test_client(&server),
        enabled_adapters(&config.enabled_platforms),
    );

    let summary = crawler.run_once(None).await.expect("run should complete");
    assert!(!summary.platforms["tiktok"].success);
}

#[tokio::test]
async fn run_once_uses_override_tags_without_touching_config() {
    let server = MockServer::start().await;
    mount_tiktok_success("jazz", vec![tiktok_item("7")])
        .mount(&server)
        .await;

    let mut config = test_config(&["music"]);
    Arc::get_mut(&mut config).unwrap().enabled_platforms = vec![Platform::Tiktok];
    let crawler = Crawler::with_client(
        Arc::clone(&config),
        test_client(&server),
        enabled_adapters(&config.enabled_platforms),
    );

    let summary = crawler
        .run_once(Some(vec!["jazz".to_string()]))
        .await
        .expect("run should complete");
    assert_eq!(summary.tags, vec!["jazz".to_string()]);
    assert_eq!(summary.platforms["tiktok"].data["jazz"].len(), 1);
    // Configured tags are untouched for subsequent runs.
    assert_eq!(config.tags, vec!["music".to_string()]);
}

#[tokio::test]
async fn concurrent_run_is_rejected_while_one_is_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/tiktok/app/v3/fetch_video_search_result"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(300))
                .set_body_json(&json!({"code": 200, "data": {"search_item_list": []}})),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&["music"]);
    Arc::get_mut(&mut config).unwrap().enabled_platforms = vec![Platform::Tiktok];
    let crawler = Arc::new(Crawler::with_client(
        Arc::clone(&config),
        test_client(&server),
        enabled_adapters(&config.enabled_platforms),
    ));

    let first = {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move { crawler.run_once(None).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(crawler.is_running());
    let second = crawler.run_once(None).await;
    assert!(matches!(second, Err(CrawlError::RunInProgress)));

    first
        .await
        .expect("task join")
        .expect("first run should complete");
    assert!(!crawler.is_running());

    // The slot is free again once the first run finishes.
    let third = crawler.run_once(None).await;
    assert!(third.is_ok());
}

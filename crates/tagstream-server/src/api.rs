//! HTTP control surface for the crawl pipeline.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use tagstream_core::{AppConfig, RunSummary};
use tagstream_crawler::{CallStats, CrawlError, Crawler, RunStore};
use tagstream_publisher::BusPublisher;

const MAX_RECENT_ERRORS: usize = 10;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub crawler: Arc<Crawler>,
    pub publisher: Arc<BusPublisher>,
    pub store: Arc<RunStore>,
    pub status: Arc<Mutex<ServerStatus>>,
}

/// Mutable run history kept across requests.
#[derive(Debug, Default)]
pub struct ServerStatus {
    pub last_run: Option<DateTime<Utc>>,
    pub last_result: Option<RunResult>,
    pub total_runs: u64,
    pub errors: Vec<RecentError>,
}

impl ServerStatus {
    fn record_error(&mut self, message: String) {
        self.errors.push(RecentError {
            time: Utc::now(),
            message,
        });
        if self.errors.len() > MAX_RECENT_ERRORS {
            let excess = self.errors.len() - MAX_RECENT_ERRORS;
            self.errors.drain(..excess);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentError {
    pub time: DateTime<Utc>,
    pub message: String,
}

/// Condensed outcome of the most recent run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<usize>,
    pub platforms: Vec<PlatformCount>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCount {
    pub name: String,
    pub success: bool,
    pub count: usize,
}

impl RunResult {
    fn from_summary(summary: &RunSummary, published: Option<usize>) -> Self {
        Self {
            success: true,
            timestamp: summary.timestamp,
            tags: summary.tags.clone(),
            published,
            platforms: summary
                .platforms
                .iter()
                .map(|(name, outcome)| PlatformCount {
                    name: name.clone(),
                    success: outcome.success,
                    count: outcome.record_count(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    running: bool,
    last_run: Option<DateTime<Utc>>,
    last_result: Option<RunResult>,
    total_runs: u64,
    errors: Vec<RecentError>,
    config: StatusConfig,
    calls: CallStats,
}

#[derive(Debug, Serialize)]
struct StatusConfig {
    tags: Vec<String>,
    platforms: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RunResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<RunResult>,
}

#[derive(Debug, Deserialize)]
struct RunTagsBody {
    #[serde(default)]
    tags: Vec<String>,
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/run", post(run))
        .route("/run/tags", post(run_tags))
        .route("/run/republish", post(republish))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(build_cors())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now(),
    }))
}

async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.status.lock().await;
    Json(StatusResponse {
        running: state.crawler.is_running(),
        last_run: status.last_run,
        last_result: status.last_result.clone(),
        total_runs: status.total_runs,
        errors: status.errors.clone(),
        config: StatusConfig {
            tags: state.config.tags.clone(),
            platforms: state
                .config
                .enabled_platforms
                .iter()
                .map(|p| p.display_name().to_string())
                .collect(),
        },
        calls: state.crawler.client().counter().snapshot(),
    })
}

async fn run(State(state): State<AppState>) -> impl IntoResponse {
    execute_run(&state, None).await
}

async fn run_tags(
    State(state): State<AppState>,
    Json(body): Json<RunTagsBody>,
) -> impl IntoResponse {
    let tags: Vec<String> = body
        .tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(RunResponse {
                success: false,
                message: "a non-empty tags array is required".to_string(),
                result: None,
            }),
        );
    }
    execute_run(&state, Some(tags)).await
}

async fn execute_run(
    state: &AppState,
    tags: Option<Vec<String>>,
) -> (StatusCode, Json<RunResponse>) {
    // last_run moves only for requests that actually get the run slot; a
    // busy rejection leaves the previous value intact.
    match state.crawler.run_once(tags).await {
        Ok(summary) => {
            // Persist and publish best-effort; neither failure fails the
            // request.
            if let Err(error) = state.store.save(&summary).await {
                tracing::error!(error = %error, "failed to persist run artifacts");
            }
            let report = state.publisher.publish_summary(&summary).await;
            let published = report.success.then_some(report.sent);

            let result = RunResult::from_summary(&summary, published);
            let mut status = state.status.lock().await;
            status.last_run = Some(summary.timestamp);
            status.total_runs += 1;
            status.last_result = Some(result.clone());
            (
                StatusCode::OK,
                Json(RunResponse {
                    success: true,
                    message: "crawl completed".to_string(),
                    result: Some(result),
                }),
            )
        }
        Err(CrawlError::RunInProgress) => (
            StatusCode::CONFLICT,
            Json(RunResponse {
                success: false,
                message: "a crawl is already running, try again later".to_string(),
                result: None,
            }),
        ),
        Err(error) => {
            let mut status = state.status.lock().await;
            status.last_run = Some(Utc::now());
            status.record_error(error.to_string());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunResponse {
                    success: false,
                    message: error.to_string(),
                    result: None,
                }),
            )
        }
    }
}

/// Re-send the latest persisted run to the bus without touching the
/// upstream API.
async fn republish(State(state): State<AppState>) -> (StatusCode, Json<RunResponse>) {
    if state.crawler.is_running() {
        return (
            StatusCode::CONFLICT,
            Json(RunResponse {
                success: false,
                message: "a crawl is already running, try again later".to_string(),
                result: None,
            }),
        );
    }

    let fail = |status: &mut ServerStatus, code: StatusCode, message: String| {
        status.record_error(message.clone());
        (
            code,
            Json(RunResponse {
                success: false,
                message,
                result: None,
            }),
        )
    };

    if !state.publisher.is_enabled() {
        let mut status = state.status.lock().await;
        return fail(
            &mut status,
            StatusCode::SERVICE_UNAVAILABLE,
            "message bus is not configured".to_string(),
        );
    }

    let summary = match state.store.load_latest().await {
        Ok(Some(summary)) => summary,
        Ok(None) => {
            let mut status = state.status.lock().await;
            return fail(
                &mut status,
                StatusCode::NOT_FOUND,
                "no stored run to republish, run a crawl first".to_string(),
            );
        }
        Err(error) => {
            let mut status = state.status.lock().await;
            return fail(
                &mut status,
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to load stored run: {error}"),
            );
        }
    };

    let report = state.publisher.publish_summary(&summary).await;
    if !report.success {
        let mut status = state.status.lock().await;
        return fail(
            &mut status,
            StatusCode::BAD_GATEWAY,
            "publishing the stored run failed".to_string(),
        );
    }

    let result = RunResult::from_summary(&summary, Some(report.sent));
    let mut status = state.status.lock().await;
    status.last_run = Some(Utc::now());
    status.total_runs += 1;
    status.last_result = Some(result.clone());
    (
        StatusCode::OK,
        Json(RunResponse {
            success: true,
            message: format!("republished {} messages", report.sent),
            result: Some(result),
        }),
    )
}

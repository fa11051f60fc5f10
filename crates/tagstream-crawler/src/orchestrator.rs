//! Single-flight crawl orchestrator.
//!
//! One run fans out across the enabled platforms concurrently; within a
//! platform, tags are fetched sequentially with a fixed pause between them
//! to stay under upstream rate limits. A failing tag or platform never
//! aborts the run: its error is recorded and the rest continues.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

use tagstream_core::{AppConfig, PlatformOutcome, RunSummary};

use crate::adapters::{enabled_adapters, PlatformAdapter};
use crate::client::UpstreamClient;
use crate::counter::CallCounter;
use crate::error::CrawlError;
use crate::retry::with_retry;

/// Drives crawl runs. At most one run is in flight at a time.
pub struct Crawler {
    config: Arc<AppConfig>,
    client: Arc<UpstreamClient>,
    adapters: Vec<Arc<dyn PlatformAdapter>>,
    running: AtomicBool,
}

/// Clears the running flag when a run exits, on any path.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Crawler {
    /// Build a crawler with one adapter per enabled platform.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the HTTP client cannot be built.
    pub fn new(config: Arc<AppConfig>, counter: Arc<CallCounter>) -> Result<Self, CrawlError> {
        let client = Arc::new(UpstreamClient::new(&config, counter)?);
        let adapters = enabled_adapters(&config.enabled_platforms);
        Ok(Self {
            config,
            client,
            adapters,
            running: AtomicBool::new(false),
        })
    }

    /// Build a crawler around an existing client and adapter set. Used by
    /// tests that point the client at a mock server.
    #[must_use]
    pub fn with_client(
        config: Arc<AppConfig>,
        client: Arc<UpstreamClient>,
        adapters: Vec<Arc<dyn PlatformAdapter>>,
    ) -> Self {
        Self {
            config,
            client,
            adapters,
            running: AtomicBool::new(false),
        }
    }

    /// Whether a run is currently in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn client(&self) -> &Arc<UpstreamClient> {
        &self.client
    }

    /// Execute one crawl over the configured platforms.
    ///
    /// `tags_override`, when given, replaces the configured tag list for
    /// this run only; the configuration itself is never mutated.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::RunInProgress`] if another run is already in
    /// flight. Per-platform and per-tag failures do not error the run; they
    /// are recorded in the returned summary.
    pub async fn run_once(
        &self,
        tags_override: Option<Vec<String>>,
    ) -> Result<RunSummary, CrawlError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CrawlError::RunInProgress);
        }
        let _guard = RunGuard(&self.running);

        let tags = tags_override.unwrap_or_else(|| self.config.tags.clone());
        tracing::info!(tags = ?tags, platforms = self.adapters.len(), "crawl run started");
        let started = std::time::Instant::now();

        let handles: Vec<_> = self
            .adapters
            .iter()
            .map(|adapter| {
                let adapter = Arc::clone(adapter);
                let client = Arc::clone(&self.client);
                let config = Arc::clone(&self.config);
                let tags = tags.clone();
                tokio::spawn(async move {
                    crawl_platform(adapter.as_ref(), &client, &config, &tags).await
                })
            })
            .collect();

        let mut platforms = std::collections::BTreeMap::new();
        for (handle, adapter) in join_all(handles).await.into_iter().zip(&self.adapters) {
            let platform = adapter.platform();
            let outcome = match handle {
                Ok(outcome) => outcome,
                Err(join_err) => {
                    tracing::error!(platform = %platform, error = %join_err, "platform task panicked");
                    PlatformOutcome::failed(platform, format!("platform task panicked: {join_err}"))
                }
            };
            platforms.insert(platform.key().to_string(), outcome);
        }

        let summary = RunSummary {
            timestamp: Utc::now(),
            tags,
            platforms,
        };
        tracing::info!(
            records = summary.record_count(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "crawl run finished"
        );
        Ok(summary)
    }
}

/// Crawl every tag for one platform, sequentially.
async fn crawl_platform(
    adapter: &dyn PlatformAdapter,
    client: &UpstreamClient,
    config: &AppConfig,
    tags: &[String],
) -> PlatformOutcome {
    let platform = adapter.platform();
    let delay = Duration::from_millis(config.request_delay_ms);
    let mut outcome = PlatformOutcome::new(platform);

    for tag in tags {
        let fetched = with_retry(config.max_attempts, delay, || {
            adapter.search_by_tag(client, tag, config.limit)
        })
        .await;

        match fetched {
            Ok(items) => {
                let records: Vec<_> = items.iter().map(|item| adapter.normalize(item)).collect();
                tracing::info!(platform = %platform, tag = %tag, count = records.len(), "tag crawled");
                outcome.data.insert(tag.clone(), records);
            }
            Err(error) => {
                tracing::warn!(platform = %platform, tag = %tag, error = %error, "tag failed");
                outcome.success = false;
                outcome.errors.push(tagstream_core::TagError {
                    tag: tag.clone(),
                    message: error.to_string(),
                });
            }
        }

        // Pace every tag, including the last, so back-to-back runs also
        // respect the gap.
        tokio::time::sleep(delay).await;
    }

    outcome
}

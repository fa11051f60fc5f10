use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use tagstream_core::AppConfig;

use crate::counter::CallCounter;
use crate::error::CrawlError;

/// Response envelope shared by every upstream aggregation endpoint.
///
/// `data` is kept as raw JSON: its shape varies between response versions
/// of the same logical endpoint, so adapters probe it with prioritized
/// candidate paths instead of a fixed schema.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ApiEnvelope {
    /// Unwrap the envelope, returning `data` on success.
    ///
    /// Both `0` and `200` are accepted as success: the upstream uses the two
    /// conventions inconsistently across endpoint versions. Flagged for
    /// upstream contract review; do not collapse to a single code.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Upstream`] carrying the upstream message when
    /// the code is not a known success code.
    pub fn into_data(self) -> Result<serde_json::Value, CrawlError> {
        match self.code {
            0 | 200 => Ok(self.data),
            code => Err(CrawlError::Upstream {
                code,
                message: self
                    .message
                    .unwrap_or_else(|| "upstream API error".to_string()),
            }),
        }
    }
}

/// Bearer-authenticated HTTP client for the upstream aggregation API.
///
/// Applies the configured per-request timeout (a timed-out call surfaces as
/// [`CrawlError::Http`] and counts as one failed attempt toward the retry
/// budget) and tallies every call on the shared [`CallCounter`].
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_key: String,
    counter: Arc<CallCounter>,
}

impl UpstreamClient {
    /// Create a client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig, counter: Arc<CallCounter>) -> Result<Self, CrawlError> {
        Self::with_base_url(
            config.api_base_url.clone(),
            config.api_key.clone(),
            config.request_timeout_secs,
            counter,
        )
    }

    /// Create a client against an explicit base URL. Used directly by tests
    /// pointing at a local mock server.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        base_url: String,
        api_key: String,
        timeout_secs: u64,
        counter: Arc<CallCounter>,
    ) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            counter,
        })
    }

    /// Issue one GET against an upstream endpoint and parse the response
    /// envelope. Does not interpret the envelope code; callers decide via
    /// [`ApiEnvelope::into_data`].
    ///
    /// # Errors
    ///
    /// Returns [`CrawlError::Http`] on transport failure, timeout, or a
    /// non-2xx HTTP status.
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<ApiEnvelope, CrawlError> {
        let url = format!("{}{path}", self.base_url);
        self.counter.record_attempt();
        tracing::debug!(%url, "upstream GET");

        let result = async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(params)
                .send()
                .await?
                .error_for_status()?;
            let envelope: ApiEnvelope = response.json().await?;
            Ok::<_, CrawlError>(envelope)
        }
        .await;

        match &result {
            Ok(_) => self.counter.record_success(),
            Err(e) => {
                self.counter.record_failure();
                tracing::debug!(%url, error = %e, "upstream call failed");
            }
        }
        result
    }

    #[must_use]
    pub fn counter(&self) -> &Arc<CallCounter> {
        &self.counter
    }
}

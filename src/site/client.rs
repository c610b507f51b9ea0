//! HTTP transport for listing pages and the retrying fetcher built on top of it.

use crate::config::Config;
use crate::error::FetchError;
use crate::site::retry::{RetryPolicy, Sleeper, TokioSleeper};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// One attempt at retrieving a listing page - enables mocking for tests.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches page `page` once. Non-2xx statuses and network faults are errors.
    async fn get_page(&self, page: u32) -> Result<String, FetchError>;
}

/// HTTP client for the listing site. Cookies persist across requests.
pub struct SiteClient {
    client: Client,
    base_url: String,
    user_agent: String,
    referer: String,
}

impl SiteClient {
    /// Creates a client from the configured base URL, headers, and timeout.
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
        })
    }

    /// URL of page `page`, using `?page=n` pagination.
    pub fn page_url(&self, page: u32) -> String {
        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}page={}", self.base_url, separator, page)
    }
}

#[async_trait]
impl PageSource for SiteClient {
    async fn get_page(&self, page: u32) -> Result<String, FetchError> {
        let url = self.page_url(page);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .emulation(Emulation::Chrome131)
            .header("User-Agent", self.user_agent.as_str())
            .header("Referer", self.referer.as_str())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "es-CO,es;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(|e| FetchError::Transport { page, message: e.to_string() })?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            return Err(FetchError::Status { page, status: status.as_u16() });
        }

        response.text().await.map_err(|e| FetchError::Transport { page, message: e.to_string() })
    }
}

/// Retries a [`PageSource`] according to a [`RetryPolicy`].
pub struct PageFetcher<S, Z = TokioSleeper> {
    source: S,
    policy: RetryPolicy,
    sleeper: Z,
}

impl<S: PageSource> PageFetcher<S, TokioSleeper> {
    /// Creates a fetcher that sleeps on the tokio timer.
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self::with_sleeper(source, policy, TokioSleeper)
    }
}

impl<S: PageSource, Z: Sleeper> PageFetcher<S, Z> {
    /// Creates a fetcher with a custom sleeper (for testing).
    pub fn with_sleeper(source: S, policy: RetryPolicy, sleeper: Z) -> Self {
        Self { source, policy, sleeper }
    }

    /// Fetches a page, backing off between failed attempts.
    ///
    /// Returns [`FetchError::Exhausted`] once the attempt ceiling is reached.
    /// No sleep follows the final attempt.
    pub async fn fetch(&self, page: u32) -> Result<String, FetchError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.source.get_page(page).await {
                Ok(body) => {
                    if attempt > 1 {
                        info!(page, attempt, "Page fetched after retry");
                    }
                    return Ok(body);
                }
                Err(e) => {
                    warn!(page, attempt, error = %e, "Page fetch attempt failed");

                    if !self.policy.should_retry(attempt) {
                        return Err(FetchError::Exhausted { page, attempts: attempt, last: Box::new(e) });
                    }

                    let delay = self.policy.backoff(attempt);
                    debug!(page, delay_ms = delay.as_millis() as u64, "Backing off");
                    self.sleeper.sleep(delay).await;
                }
            }
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }
}

//! Acquisition job: download the day's listing pages into the landing bucket.

use crate::config::Config;
use crate::jobs::{JobStats, JobStatus};
use crate::site::client::{PageFetcher, PageSource, SiteClient};
use crate::site::models::RunDate;
use crate::site::retry::Sleeper;
use crate::storage::{BlobStore, HTML_CONTENT_TYPE};
use chrono::NaiveDate;
use tracing::{error, info};

const JOB: &str = "acquire";

/// Fetches pages `1..=page_count` one at a time and stores each under the run date.
pub struct AcquisitionJob {
    config: Config,
    date: RunDate,
}

impl AcquisitionJob {
    /// Creates a new acquisition job for `date`.
    pub fn new(config: Config, date: NaiveDate) -> Self {
        Self { config, date: RunDate(date) }
    }

    /// Runs the job against the live site. Never fails; problems are reported in the status.
    pub async fn run(&self, store: &impl BlobStore) -> JobStatus {
        let client = match SiteClient::new(&self.config) {
            Ok(client) => client,
            Err(e) => {
                error!(error = %e, "Could not create HTTP client");
                return JobStatus::error(
                    JOB,
                    self.date.0,
                    format!("{:#}", e),
                    JobStats::Acquisition {
                        pages_saved: 0,
                        pages_failed: self.config.page_count as usize,
                    },
                );
            }
        };

        let fetcher = PageFetcher::new(client, self.config.retry_policy());
        self.run_with_fetcher(&fetcher, store).await
    }

    /// Runs the job with a provided fetcher (for testing).
    pub async fn run_with_fetcher<S: PageSource, Z: Sleeper>(
        &self,
        fetcher: &PageFetcher<S, Z>,
        store: &impl BlobStore,
    ) -> JobStatus {
        info!(date = %self.date, pages = self.config.page_count, "Starting acquisition");

        let mut saved = 0;
        let mut failed = 0;

        for page in 1..=self.config.page_count {
            let body = match fetcher.fetch(page).await {
                Ok(body) => body,
                Err(e) => {
                    error!(page = e.page(), error = %e, "Page download failed permanently");
                    failed += 1;
                    continue;
                }
            };

            let key = self.date.page_key(page);
            match store
                .put(&self.config.landing_bucket, &key, body.into_bytes(), HTML_CONTENT_TYPE)
                .await
            {
                Ok(()) => {
                    info!(page, key = %key, "Page saved");
                    saved += 1;
                }
                Err(e) => {
                    error!(page, key = %key, error = %e, "Failed to store page");
                    failed += 1;
                }
            }
        }

        info!(saved, failed, "Acquisition finished");

        JobStatus::ok(
            JOB,
            self.date.0,
            format!("{} of {} pages saved", saved, self.config.page_count),
            JobStats::Acquisition { pages_saved: saved, pages_failed: failed },
        )
    }
}

//! Extraction job: turn the day's stored pages into one consolidated report.

use crate::config::Config;
use crate::jobs::{JobStats, JobStatus};
use crate::report::ReportWriter;
use crate::site::models::{ListingRecord, RunDate};
use crate::site::parser::ListingExtractor;
use crate::storage::{BlobStore, CSV_CONTENT_TYPE};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

const JOB: &str = "extract";

/// Reads every page stored under the run date and writes the report once.
pub struct ExtractionJob {
    config: Config,
    date: RunDate,
    extractor: ListingExtractor,
}

impl ExtractionJob {
    /// Creates a new extraction job for `date` with the default extractor.
    pub fn new(config: Config, date: NaiveDate) -> Self {
        Self::with_extractor(config, date, ListingExtractor::new())
    }

    /// Creates a job with a custom extractor.
    pub fn with_extractor(config: Config, date: NaiveDate, extractor: ListingExtractor) -> Self {
        Self { config, date: RunDate(date), extractor }
    }

    /// Runs the job. Never fails; problems are reported in the status.
    pub async fn run(&self, store: &impl BlobStore) -> JobStatus {
        let landing = &self.config.landing_bucket;
        info!(date = %self.date, bucket = %landing, "Starting extraction");

        let mut stats = Counters::default();

        let keys = match store.list(landing, &self.date.prefix()).await {
            Ok(keys) => self.page_keys(keys),
            Err(e) => {
                error!(bucket = %landing, error = %e, "Could not list stored pages");
                return JobStatus::error(JOB, self.date.0, e.to_string(), stats.into());
            }
        };

        if keys.is_empty() {
            info!(date = %self.date, "No stored pages, nothing to process");
            return JobStatus::ok(JOB, self.date.0, "nothing to process", stats.into());
        }

        let mut records: Vec<ListingRecord> = Vec::new();

        for key in &keys {
            let body = match store.get(landing, key).await {
                Ok(body) => body,
                Err(e) => {
                    warn!(key = %key, error = %e, "Could not read stored page, skipping");
                    stats.pages_unreadable += 1;
                    continue;
                }
            };

            let markup = String::from_utf8_lossy(&body);
            let page_records = self.extractor.extract(&markup, self.date.0);
            stats.pages_read += 1;

            if page_records.is_empty() {
                info!(key = %key, "No listings found in page");
                stats.pages_empty += 1;
            } else {
                debug!(key = %key, records = page_records.len(), "Page extracted");
            }

            records.extend(page_records);
        }

        if records.is_empty() {
            info!(date = %self.date, pages = keys.len(), "No listings found");
            return JobStatus::ok(JOB, self.date.0, "no listings found", stats.into());
        }

        stats.records = records.len();
        let body = ReportWriter::new(self.config.delimiter).render(&records);
        let bucket = &self.config.final_bucket;
        let report_key = self.date.report_key();

        match store.put(bucket, &report_key, body.into_bytes(), CSV_CONTENT_TYPE).await {
            Ok(()) => {
                info!(bucket = %bucket, key = %report_key, records = stats.records, "Report written");
                JobStatus::ok(
                    JOB,
                    self.date.0,
                    format!("{} listings written to {}/{}", stats.records, bucket, report_key),
                    stats.into(),
                )
            }
            Err(e) => {
                error!(bucket = %bucket, key = %report_key, error = %e, "Failed to write report");
                JobStatus::error(JOB, self.date.0, e.to_string(), stats.into())
            }
        }
    }

    /// Orders keys by page index (`page2` before `page10`), skipping the report itself.
    fn page_keys(&self, mut keys: Vec<String>) -> Vec<String> {
        let report_key = self.date.report_key();
        keys.retain(|key| *key != report_key);
        keys.sort_by(|a, b| {
            let index = |key: &str| self.date.page_index(key).unwrap_or(u32::MAX);
            index(a).cmp(&index(b)).then_with(|| a.cmp(b))
        });
        keys
    }
}

#[derive(Debug, Default)]
struct Counters {
    pages_read: usize,
    pages_empty: usize,
    pages_unreadable: usize,
    records: usize,
}

impl From<Counters> for JobStats {
    fn from(c: Counters) -> Self {
        JobStats::Extraction {
            pages_read: c.pages_read,
            pages_empty: c.pages_empty,
            pages_unreadable: c.pages_unreadable,
            records: c.records,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Delimiter;
    use crate::error::StoreError;
    use crate::storage::{MemoryBlobStore, HTML_CONTENT_TYPE};
    use async_trait::async_trait;

    const LANDING: &str = "landing-casas-c";
    const FINAL: &str = "zappa-casas-oo-1000";

    const ONE_LISTING: &str = "<html><body><script type='application/ld+json'>\
        [{\"about\": [{\"address\": {\"streetAddress\": \"Barrio 1, Algún lugar\"},\
        \"description\": \"Venta $590.000\\nMás info\",\
        \"numberOfBedrooms\": 2,\
        \"numberOfBathroomsTotal\": 1,\
        \"floorSize\": {\"value\": 50}}]}]\
        </script></body></html>";

    /// Store whose reads fail for one key while still listing it.
    struct UnreadableKeyStore {
        inner: MemoryBlobStore,
        unreadable: &'static str,
    }

    #[async_trait]
    impl BlobStore for UnreadableKeyStore {
        async fn put(
            &self,
            bucket: &str,
            key: &str,
            body: Vec<u8>,
            content_type: &str,
        ) -> Result<(), StoreError> {
            self.inner.put(bucket, key, body, content_type).await
        }

        async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
            if key == self.unreadable {
                return Err(StoreError::Io {
                    path: format!("{}/{}", bucket, key),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                });
            }
            self.inner.get(bucket, key).await
        }

        async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
            self.inner.list(bucket, prefix).await
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    async fn store_page(store: &MemoryBlobStore, key: &str, html: &str) {
        store.put(LANDING, key, html.as_bytes().to_vec(), HTML_CONTENT_TYPE).await.unwrap();
    }

    fn report(store: &MemoryBlobStore) -> Option<String> {
        store
            .object(FINAL, "2025-03-10/2025-03-10.csv")
            .map(|object| String::from_utf8(object.body).unwrap())
    }

    #[tokio::test]
    async fn test_nothing_to_process() {
        let store = MemoryBlobStore::new();
        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert!(status.is_ok());
        assert_eq!(status.summary, "nothing to process");
        assert_eq!(store.put_count(), 0);
    }

    #[tokio::test]
    async fn test_single_listing_report() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-10/2025-03-10-page1.html", ONE_LISTING).await;

        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert!(status.is_ok());
        assert_eq!(store.put_count(), 2); // seeded page + report
        assert_eq!(store.get_count(), 1);

        let object = store.object(FINAL, "2025-03-10/2025-03-10.csv").unwrap();
        assert_eq!(object.content_type, CSV_CONTENT_TYPE);

        let csv = report(&store).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "FechaDescarga,Barrio,Valor,NumHabitaciones,NumBanos,mts2");
        assert_eq!(lines[1], "2025-03-10,Barrio 1,590000,2,1,50");
    }

    #[tokio::test]
    async fn test_no_listings_found() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-10/2025-03-10-page1.html", "<html><body>vacío</body></html>")
            .await;
        store_page(&store, "2025-03-10/2025-03-10-page2.html", "").await;

        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert!(status.is_ok());
        assert_eq!(status.summary, "no listings found");
        assert!(report(&store).is_none());
        assert_eq!(
            status.stats,
            JobStats::Extraction { pages_read: 2, pages_empty: 2, pages_unreadable: 0, records: 0 }
        );
    }

    #[tokio::test]
    async fn test_empty_page_does_not_abort() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-10/2025-03-10-page1.html", "<html></html>").await;
        store_page(&store, "2025-03-10/2025-03-10-page2.html", ONE_LISTING).await;

        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert!(status.is_ok());
        assert_eq!(report(&store).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_unreadable_page_is_skipped() {
        let inner = MemoryBlobStore::new();
        store_page(&inner, "2025-03-10/2025-03-10-page1.html", ONE_LISTING).await;
        let chapinero = ONE_LISTING.replace("Barrio 1", "Chapinero");
        store_page(&inner, "2025-03-10/2025-03-10-page2.html", &chapinero).await;
        let store = UnreadableKeyStore { inner, unreadable: "2025-03-10/2025-03-10-page1.html" };

        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert!(status.is_ok());
        assert_eq!(
            status.stats,
            JobStats::Extraction { pages_read: 1, pages_empty: 0, pages_unreadable: 1, records: 1 }
        );

        let csv = report(&store.inner).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2025-03-10,Chapinero,590000,2,1,50");
    }

    #[tokio::test]
    async fn test_only_reads_own_date() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-09/2025-03-09-page1.html", ONE_LISTING).await;

        let status = ExtractionJob::new(Config::default(), date()).run(&store).await;

        assert_eq!(status.summary, "nothing to process");
        assert_eq!(store.get_count(), 0);
    }

    #[tokio::test]
    async fn test_rows_follow_page_order() {
        let store = MemoryBlobStore::new();
        let page = |barrio: &str| ONE_LISTING.replace("Barrio 1", barrio);
        store_page(&store, "2025-03-10/2025-03-10-page10.html", &page("Diez")).await;
        store_page(&store, "2025-03-10/2025-03-10-page2.html", &page("Dos")).await;
        store_page(&store, "2025-03-10/2025-03-10-page1.html", &page("Uno")).await;

        ExtractionJob::new(Config::default(), date()).run(&store).await;

        let csv = report(&store).unwrap();
        let barrios: Vec<&str> =
            csv.lines().skip(1).map(|line| line.split(',').nth(1).unwrap()).collect();
        assert_eq!(barrios, vec!["Uno", "Dos", "Diez"]);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_report() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-10/2025-03-10-page1.html", ONE_LISTING).await;
        let job = ExtractionJob::new(Config::default(), date());

        job.run(&store).await;
        job.run(&store).await;

        assert_eq!(store.list(FINAL, "2025-03-10/").await.unwrap().len(), 1);
        assert_eq!(report(&store).unwrap().lines().count(), 2);
    }

    #[tokio::test]
    async fn test_semicolon_delimiter() {
        let store = MemoryBlobStore::new();
        store_page(&store, "2025-03-10/2025-03-10-page1.html", ONE_LISTING).await;
        let config = Config { delimiter: Delimiter::Semicolon, ..Config::default() };

        ExtractionJob::new(config, date()).run(&store).await;

        let csv = report(&store).unwrap();
        assert!(csv.starts_with("FechaDescarga;Barrio;Valor;NumHabitaciones;NumBanos;mts2\n"));
        assert!(csv.contains("2025-03-10;Barrio 1;590000;2;1;50"));
    }

    #[test]
    fn test_page_keys_ordering() {
        let job = ExtractionJob::new(Config::default(), date());
        let keys = vec![
            "2025-03-10/2025-03-10-page10.html".to_string(),
            "2025-03-10/notes.txt".to_string(),
            "2025-03-10/2025-03-10.csv".to_string(),
            "2025-03-10/2025-03-10-page9.html".to_string(),
        ];

        assert_eq!(
            job.page_keys(keys),
            vec![
                "2025-03-10/2025-03-10-page9.html",
                "2025-03-10/2025-03-10-page10.html",
                "2025-03-10/notes.txt",
            ]
        );
    }
}

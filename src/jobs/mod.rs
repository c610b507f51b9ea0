//! Daily pipeline jobs.

pub mod acquire;
pub mod extract;

pub use acquire::AcquisitionJob;
pub use extract::ExtractionJob;

use chrono::NaiveDate;
use serde::Serialize;

/// Overall outcome reported to the trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

/// Counters describing what a job did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum JobStats {
    Acquisition { pages_saved: usize, pages_failed: usize },
    Extraction { pages_read: usize, pages_empty: usize, pages_unreadable: usize, records: usize },
}

/// Status payload returned by every job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub status: Status,
    pub job: &'static str,
    pub date: NaiveDate,
    pub summary: String,
    pub stats: JobStats,
}

impl JobStatus {
    pub fn ok(job: &'static str, date: NaiveDate, summary: impl Into<String>, stats: JobStats) -> Self {
        Self { status: Status::Ok, job, date, summary: summary.into(), stats }
    }

    pub fn error(
        job: &'static str,
        date: NaiveDate,
        summary: impl Into<String>,
        stats: JobStats,
    ) -> Self {
        Self { status: Status::Error, job, date, summary: summary.into(), stats }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    /// JSON form printed by the CLI.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{\"status\": \"error\"}".to_string())
    }
}

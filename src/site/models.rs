//! Data models for listing records and stored pages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder written for any field that could not be determined.
pub const NA: &str = "N/A";

/// Date format used in storage keys and report rows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single extracted field. Values are carried as the source encoded them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Missing,
    Number(serde_json::Number),
    Text(String),
}

impl FieldValue {
    /// Builds a text value, mapping blank text to `Missing`.
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() || value == NA {
            FieldValue::Missing
        } else {
            FieldValue::Text(value)
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, FieldValue::Missing)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::text(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Missing => write!(f, "{}", NA),
            FieldValue::Number(n) => write!(f, "{}", n),
            FieldValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One real-estate listing found on a source page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Date the page was downloaded
    pub fetch_date: NaiveDate,
    /// Neighborhood, first segment of the street address
    pub neighborhood: FieldValue,
    /// Normalized digit string
    pub price: FieldValue,
    pub bedroom_count: FieldValue,
    pub bathroom_count: FieldValue,
    /// Floor area, square meters
    pub area_value: FieldValue,
}

impl ListingRecord {
    /// Creates a record with every field missing.
    pub fn empty(fetch_date: NaiveDate) -> Self {
        Self {
            fetch_date,
            neighborhood: FieldValue::Missing,
            price: FieldValue::Missing,
            bedroom_count: FieldValue::Missing,
            bathroom_count: FieldValue::Missing,
            area_value: FieldValue::Missing,
        }
    }
}

/// Storage key helpers for a run date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDate(pub NaiveDate);

impl RunDate {
    /// Prefix every artifact of this run lives under, e.g. `2025-03-10/`.
    pub fn prefix(&self) -> String {
        format!("{}/", self)
    }

    /// Key of a raw page, e.g. `2025-03-10/2025-03-10-page3.html`.
    pub fn page_key(&self, page: u32) -> String {
        format!("{date}/{date}-page{page}.html", date = self)
    }

    /// Key of the consolidated report, e.g. `2025-03-10/2025-03-10.csv`.
    pub fn report_key(&self) -> String {
        format!("{date}/{date}.csv", date = self)
    }

    /// Extracts the page index from a key produced by [`RunDate::page_key`].
    pub fn page_index(&self, key: &str) -> Option<u32> {
        let rest = key.strip_prefix(&self.prefix())?;
        let rest = rest.strip_prefix(&format!("{}-page", self))?;
        rest.strip_suffix(".html")?.parse().ok()
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

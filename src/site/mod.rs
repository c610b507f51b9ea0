//! Listing-site specific modules: HTTP fetching, parsing, and data models.

pub mod client;
pub mod models;
pub mod parser;
pub mod price;
pub mod retry;
pub mod selectors;

pub use client::{PageFetcher, PageSource, SiteClient};
pub use models::{FieldValue, ListingRecord, RunDate, NA};
pub use parser::ListingExtractor;
pub use retry::{RetryPolicy, Sleeper};

//! listings-pipeline - daily real-estate listing acquisition and extraction
//!
//! Downloads a fixed range of listing pages into a blob store, then extracts
//! neighborhood, price, rooms, bathrooms, and area from every stored page
//! into one delimited-text report per day.

pub mod config;
pub mod error;
pub mod jobs;
pub mod report;
pub mod site;
pub mod storage;

pub use config::{Config, Delimiter};
pub use error::{ExtractionFault, FetchError, StoreError};
pub use jobs::{AcquisitionJob, ExtractionJob, JobStatus};
pub use site::{ListingExtractor, ListingRecord};
pub use storage::{BlobStore, LocalBlobStore, MemoryBlobStore};

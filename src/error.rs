//! Typed errors raised at component boundaries.

use thiserror::Error;

/// Failure to retrieve a listing page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("page {page} returned status {status}")]
    Status { page: u32, status: u16 },

    /// Network-level fault (connect, timeout, body read).
    #[error("request for page {page} failed: {message}")]
    Transport { page: u32, message: String },

    /// Every attempt allowed by the retry policy failed.
    #[error("page {page} abandoned after {attempts} attempts: {last}")]
    Exhausted {
        page: u32,
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Page index the error refers to.
    pub fn page(&self) -> u32 {
        match self {
            FetchError::Status { page, .. }
            | FetchError::Transport { page, .. }
            | FetchError::Exhausted { page, .. } => *page,
        }
    }
}

/// Problem building a single listing record. The entry is skipped, siblings are kept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionFault {
    #[error("entry is not a JSON object")]
    NotAnObject,

    #[error("field `{field}` has unexpected type: expected {expected}")]
    WrongType { field: &'static str, expected: &'static str },
}

/// Blob store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("invalid key `{0}`")]
    InvalidKey(String),

    #[error("storage I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

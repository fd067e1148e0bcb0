//! Unified error types for docstash.
//!
//! Every message starts with a stable code so callers and logs can match on
//! the failure class without parsing the rest of the text.

use std::path::PathBuf;

/// Unified error types for docstash.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty file id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Nothing usable in the local store for a cache-only read.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Local store I/O failed.
    #[error("STORAGE_ERROR: {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stored payload could not be encoded or decoded.
    #[error("STORAGE_ERROR: bad payload for {descriptor}: {reason}")]
    Encoding { descriptor: String, reason: String },

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// A single request attempt timed out.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Every attempt allowed by the retry policy timed out.
    #[error("FETCH_FAILED: gave up after {attempts} attempts: {last}")]
    FetchFailed { attempts: u32, last: String },

    /// HTTP error response.
    #[error("HTTP_ERROR: status {status} for {url}")]
    HttpError { status: u16, url: String },

    /// Any other failure reported by the remote side or the transport.
    #[error("REMOTE_ERROR: {0}")]
    RemoteError(String),

    /// Content was requested from an entity that was never preloaded.
    #[error("NOT_PRELOADED: {0}")]
    NotPreloaded(String),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Storage { path: path.into(), source }
    }

    /// Whether the failure is a timeout worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::FetchTimeout(_))
    }
}

//! Files API client.
//!
//! Talks to a Google Drive v3 style API through an already-authenticated
//! [`Transport`].
//!
//! ### Calls
//! - **Metadata**: `GET {base}/files/{id}?fields=...` with an explicit field
//!   list. The fingerprint is computed locally from version, modification
//!   time and checksum.
//! - **Export**: `GET {base}/files/{id}/export?mimeType=...`, one attempt.
//! - **Export link**: `GET {link}` as found in the metadata. Timeouts are
//!   retried with a doubling per-attempt timeout (30s, 60s, 120s, 240s by
//!   default) and a pause of half the previous timeout in between. Other
//!   errors are returned at once.

pub mod resource;
pub mod retry;

pub use resource::{FileResource, METADATA_FIELDS, MISSING_FIELD, compute_fingerprint};
pub use retry::RetryPolicy;

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use url::Url;

use crate::transport::Transport;
use docstash_core::{AppConfig, Error, Metadata};

/// Default base URL of the files API.
const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Default timeout for metadata and export calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

type SleepFn = Arc<dyn Fn(Duration) + Send + Sync>;

/// Files API client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Base URL (default: https://www.googleapis.com/drive/v3).
    pub base_url: String,
    /// Timeout for metadata and export calls (default: 20s).
    pub timeout: Duration,
    /// Retry policy for export link downloads.
    pub retry: RetryPolicy,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout: DEFAULT_TIMEOUT, retry: RetryPolicy::default() }
    }
}

impl From<&AppConfig> for DriveConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api_base_url.clone(),
            timeout: config.timeout(),
            retry: RetryPolicy { initial_timeout: config.link_timeout(), max_retries: config.link_max_retries },
        }
    }
}

/// Files API client.
#[derive(Clone)]
pub struct DriveClient<T> {
    transport: T,
    config: DriveConfig,
    base: Url,
    sleep: SleepFn,
}

impl<T: Transport> DriveClient<T> {
    /// Create a new client over `transport`.
    pub fn new(transport: T, config: DriveConfig) -> Result<Self, Error> {
        let base = Url::parse(&config.base_url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidUrl(format!("{}: not a base URL", config.base_url)));
        }

        Ok(Self { transport, config, base, sleep: Arc::new(std::thread::sleep) })
    }

    /// Replace the function used to pause between retries.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Arc::new(sleep);
        self
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// URL of the metadata call for a file.
    pub fn metadata_url(&self, file_id: &str) -> Result<Url, Error> {
        let mut url = self.file_url(file_id, None)?;
        url.query_pairs_mut().append_pair("fields", METADATA_FIELDS);
        Ok(url)
    }

    /// URL of the export call for a file and mime type.
    pub fn export_url(&self, file_id: &str, mime_type: &str) -> Result<Url, Error> {
        let mut url = self.file_url(file_id, Some("export"))?;
        url.query_pairs_mut().append_pair("mimeType", mime_type);
        Ok(url)
    }

    /// Fetch the metadata of a file and derive its fingerprint.
    pub fn fetch_metadata(&self, file_id: &str) -> Result<Metadata, Error> {
        let start = Instant::now();
        let url = self.metadata_url(file_id)?;

        let bytes = self.transport.get(&url, self.config.timeout)?;
        let raw: FileResource = serde_json::from_slice(&bytes)
            .map_err(|e| Error::RemoteError(format!("invalid metadata for {file_id}: {e}")))?;
        let metadata = Metadata::from(raw);

        tracing::debug!(
            file_id,
            fingerprint = %metadata.fingerprint,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched metadata"
        );

        Ok(metadata)
    }

    /// Export a file's content through the export call.
    pub fn fetch_content(&self, file_id: &str, mime_type: &str) -> Result<Bytes, Error> {
        let start = Instant::now();
        let url = self.export_url(file_id, mime_type)?;

        let bytes = self.transport.get(&url, self.config.timeout)?;

        tracing::debug!("exported {} as {} in {}ms ({} bytes)", file_id, mime_type, start.elapsed().as_millis(), bytes.len());

        Ok(bytes)
    }

    /// Download an export link, retrying timeouts per the retry policy.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` if `link` does not parse
    /// - `FetchFailed` once every allowed attempt has timed out
    /// - any non-timeout transport error, unchanged, on first occurrence
    pub fn fetch_by_link(&self, link: &str) -> Result<Bytes, Error> {
        let url = Url::parse(link).map_err(|e| Error::InvalidUrl(format!("{link}: {e}")))?;
        let policy = self.config.retry;
        let start = Instant::now();

        let mut schedule = policy.schedule().peekable();
        let mut attempts = 0;
        while let Some(timeout) = schedule.next() {
            attempts += 1;
            match self.transport.get(&url, timeout) {
                Ok(bytes) => {
                    tracing::debug!(
                        "downloaded {} in {}ms after {} attempt(s) ({} bytes)",
                        url,
                        start.elapsed().as_millis(),
                        attempts,
                        bytes.len()
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_transient() => {
                    if schedule.peek().is_none() {
                        return Err(Error::FetchFailed { attempts, last: e.to_string() });
                    }
                    let pause = RetryPolicy::pause_after(timeout);
                    tracing::warn!(
                        retry = attempts,
                        timeout_secs = timeout.as_secs(),
                        pause_secs = pause.as_secs(),
                        %url,
                        "export link timed out, retrying"
                    );
                    (self.sleep)(pause);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::FetchFailed { attempts, last: "retry policy allows no attempts".into() })
    }

    fn file_url(&self, file_id: &str, action: Option<&str>) -> Result<Url, Error> {
        if file_id.trim().is_empty() {
            return Err(Error::InvalidInput("file id cannot be empty".into()));
        }

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidUrl(format!("{}: not a base URL", self.base)))?;
            segments.pop_if_empty().push("files").push(file_id);
            if let Some(action) = action {
                segments.push(action);
            }
        }
        Ok(url)
    }
}

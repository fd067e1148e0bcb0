//! Authenticated HTTP transport.
//!
//! The client never builds credentials itself: it is handed a transport that
//! is already allowed to talk to the files API. Obtaining and refreshing the
//! bearer token happens elsewhere.
//!
//! ### Error classification
//! - No data for longer than the timeout, while connecting or reading: `FetchTimeout`
//! - Non-2xx status: `HttpError`
//! - Anything else (DNS, TLS, connection reset): `RemoteError`

use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::blocking::Client;
use url::Url;

use docstash_core::Error;

/// A blocking GET with a per-request read timeout.
///
/// The timeout bounds each wait for data, not the whole transfer: a body
/// that keeps arriving may take longer than `timeout` in total.
/// Implementations return the whole response body. Timeouts must be reported
/// as [`Error::FetchTimeout`], since that is the only error the client retries.
pub trait Transport {
    fn get(&self, url: &Url, timeout: Duration) -> Result<Bytes, Error>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, url: &Url, timeout: Duration) -> Result<Bytes, Error> {
        (**self).get(url, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &Url, timeout: Duration) -> Result<Bytes, Error> {
        (**self).get(url, timeout)
    }
}

/// Configuration for the HTTP transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// User agent string (default: "docstash/0.1")
    pub user_agent: String,

    /// Bearer token sent with every request, if any.
    pub access_token: Option<String>,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { user_agent: "docstash/0.1".to_string(), access_token: None, max_redirects: 5 }
    }
}

/// Blocking reqwest transport carrying a bearer token.
///
/// A blocking client's own timeout applies to each connect, read and write,
/// while a per-request timeout is a deadline for the whole transfer. So one
/// client is kept per distinct timeout, built on first use.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    config: TransportConfig,
    clients: Arc<Mutex<HashMap<Duration, Client>>>,
}

impl HttpTransport {
    /// Create a new transport with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config, clients: Arc::default() }
    }

    fn client_for(&self, timeout: Duration) -> Result<Client, Error> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&timeout) {
            return Ok(client.clone());
        }

        let client = Client::builder()
            .user_agent(&self.config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(self.config.max_redirects))
            .timeout(timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::RemoteError(format!("failed to build HTTP client: {}", e)))?;

        tracing::trace!("built HTTP client for {:?} read timeout", timeout);
        clients.insert(timeout, client.clone());
        Ok(client)
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, timeout: Duration) -> Result<Bytes, Error> {
        let start = Instant::now();

        let mut request = self.client_for(timeout)?.get(url.as_str());
        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let mut response = request.send().map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError { status: status.as_u16(), url: url.to_string() });
        }

        // Each read waits at most `timeout`; `bytes()` would bound the whole body.
        let mut body = Vec::new();
        response.read_to_end(&mut body).map_err(|e| classify_read(url, e))?;

        tracing::debug!("fetched {} in {}ms ({} bytes)", url, start.elapsed().as_millis(), body.len());

        Ok(Bytes::from(body))
    }
}

fn classify(url: &Url, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::RemoteError(format!("network error for {url}: {err}"))
    }
}

fn classify_read(url: &Url, err: io::Error) -> Error {
    let timed_out = err.kind() == io::ErrorKind::TimedOut
        || err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<reqwest::Error>())
            .is_some_and(reqwest::Error::is_timeout);
    if timed_out {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::RemoteError(format!("failed reading body of {url}: {err}"))
    }
}

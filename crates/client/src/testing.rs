//! Scripted transport shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use url::Url;

use crate::transport::Transport;
use docstash_core::Error;

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Body(Bytes),
    Timeout,
    Status(u16),
}

impl Reply {
    pub(crate) fn body(content: impl Into<Bytes>) -> Self {
        Reply::Body(content.into())
    }
}

struct Route {
    needle: String,
    replies: VecDeque<Reply>,
}

/// Answers by the first route whose needle occurs in the URL.
///
/// Replies are consumed in order; the last one repeats forever.
#[derive(Default)]
pub(crate) struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<(String, Duration)>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script the replies for URLs containing `needle`, replacing any
    /// earlier script for the same needle.
    pub(crate) fn on(&self, needle: &str, replies: impl IntoIterator<Item = Reply>) {
        let replies: VecDeque<Reply> = replies.into_iter().collect();
        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|r| r.needle == needle) {
            Some(route) => route.replies = replies,
            None => routes.push(Route { needle: needle.to_string(), replies }),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of requests whose URL contains `needle`.
    pub(crate) fn count(&self, needle: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(url, _)| url.contains(needle)).count()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &Url, timeout: Duration) -> Result<Bytes, Error> {
        self.calls.lock().unwrap().push((url.to_string(), timeout));

        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes.iter_mut().find(|r| url.as_str().contains(&r.needle)) else {
            return Err(Error::RemoteError(format!("no scripted reply for {url}")));
        };
        let reply = if route.replies.len() > 1 { route.replies.pop_front() } else { route.replies.front().cloned() };

        match reply {
            Some(Reply::Body(bytes)) => Ok(bytes),
            Some(Reply::Timeout) => Err(Error::FetchTimeout(format!("{url}: timed out after {timeout:?}"))),
            Some(Reply::Status(status)) => Err(Error::HttpError { status, url: url.to_string() }),
            None => Err(Error::RemoteError(format!("empty script for {url}"))),
        }
    }
}

/// Files API metadata body with the given version and export links.
pub(crate) fn metadata_body(name: &str, version: &str, links: &[(&str, &str)]) -> Reply {
    let links: serde_json::Map<String, serde_json::Value> =
        links.iter().map(|(mime, url)| (mime.to_string(), serde_json::Value::from(*url))).collect();
    let body = serde_json::json!({
        "name": name,
        "version": version,
        "modifiedTime": "2024-05-01T10:00:00.000Z",
        "exportLinks": links,
    });
    Reply::body(body.to_string())
}

/// Sleep function that records the pauses instead of blocking.
pub(crate) fn recording_sleep() -> (Arc<Mutex<Vec<Duration>>>, impl Fn(Duration) + Send + Sync + 'static) {
    let pauses = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&pauses);
    (pauses, move |d| sink.lock().unwrap().push(d))
}

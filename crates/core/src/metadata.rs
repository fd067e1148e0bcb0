//! Remote document metadata as seen by the cache.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata of a remote document.
///
/// The fingerprint changes whenever the remote content changes; the cache
/// compares it for equality and never looks inside it. Export links are kept
/// sorted so the structured encoding written to the store is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub fingerprint: String,
    #[serde(default)]
    pub export_links: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new(title: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self { title: title.into(), fingerprint: fingerprint.into(), export_links: BTreeMap::new() }
    }

    /// Add an export link for a mime type.
    pub fn with_export_link(mut self, mime_type: impl Into<String>, url: impl Into<String>) -> Self {
        self.export_links.insert(mime_type.into(), url.into());
        self
    }

    /// Direct download link for the given mime type, if the remote offered one.
    pub fn export_link(&self, mime_type: &str) -> Option<&str> {
        self.export_links.get(mime_type).map(String::as_str)
    }
}

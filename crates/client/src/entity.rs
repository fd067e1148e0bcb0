//! Per-document cache controller.
//!
//! A [`CachedEntity`] decides, from a fresh metadata fetch, whether the copy
//! in the local store can be used, and hands out the content through a
//! memoizing accessor.
//!
//! Workflow for one access cycle:
//! - fetch the metadata and its fingerprint once;
//! - compare it with the fingerprint stored for the document;
//! - pick where the content comes from ([`ContentSource`]);
//! - read the content lazily, at most once;
//! - persist fresh content either right away ([`CachedEntity::preload_sync`])
//!   or when the caller asks ([`CachedEntity::commit`]).
//!
//! The metadata and the content are two separate calls. If the document
//! changes in between, the store keeps the older fingerprint next to the newer
//! content; the next cycle sees a mismatch and downloads again.

use bytes::Bytes;

use crate::context::DocContext;
use crate::transport::Transport;
use docstash_core::{Error, Metadata, PayloadKind};

/// Descriptor of the cached content for a file in one mime type.
pub fn content_descriptor(file_id: &str, mime_type: &str) -> String {
    format!("doc-content-{file_id}-{mime_type}")
}

/// Descriptor of the stored fingerprint for a file.
pub fn fingerprint_descriptor(file_id: &str) -> String {
    format!("doc-hash-{file_id}")
}

/// Descriptor of the stored metadata record for a file.
pub fn metadata_descriptor(file_id: &str) -> String {
    format!("doc-metadata-{file_id}")
}

/// How the entity was populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Metadata and, when stale, content fetched and stored immediately.
    Eager,
    /// Metadata now; content on first read; store written on commit.
    Deferred,
    /// No network; everything from the store.
    CacheOnly,
}

/// Outcome of the fingerprint comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Valid,
    StaleOrMissing,
}

/// Where the content will be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    CacheRead,
    /// Download from the export link when there is one, else the export call.
    NetworkFetch { export_link: Option<String> },
}

/// Observable lifecycle of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Uninitialized,
    CacheValid,
    CacheStaleOrMissing,
    ContentResolved,
}

/// Result of [`CachedEntity::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Nothing new to write: the cache was valid or the content is already stored.
    Skipped,
    /// The cache is stale but the content was never read, so the stored
    /// fingerprint is left alone.
    NothingFetched,
    /// Content, metadata record and fingerprint were written.
    Persisted,
    /// Writing failed; the failure was logged and the entity is still usable.
    Failed,
}

/// One remote document seen through the local cache.
pub struct CachedEntity<'a, T> {
    ctx: &'a DocContext<T>,
    file_id: String,
    mime_type: String,
    metadata: Option<Metadata>,
    strategy: Option<Strategy>,
    freshness: Option<Freshness>,
    source: Option<ContentSource>,
    content: Option<Bytes>,
    unsaved: bool,
}

impl<'a, T: Transport> CachedEntity<'a, T> {
    pub(crate) fn new(ctx: &'a DocContext<T>, file_id: String, mime_type: String) -> Self {
        Self {
            ctx,
            file_id,
            mime_type,
            metadata: None,
            strategy: None,
            freshness: None,
            source: None,
            content: None,
            unsaved: false,
        }
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.fingerprint.as_str())
    }

    pub fn strategy(&self) -> Option<Strategy> {
        self.strategy
    }

    pub fn freshness(&self) -> Option<Freshness> {
        self.freshness
    }

    pub fn source(&self) -> Option<&ContentSource> {
        self.source.as_ref()
    }

    /// Whether a preload succeeded and content can be requested.
    pub fn is_available(&self) -> bool {
        self.source.is_some()
    }

    /// Whether the stored copy matched the remote fingerprint.
    pub fn is_up_to_date(&self) -> bool {
        self.freshness == Some(Freshness::Valid)
    }

    pub fn is_content_fetched(&self) -> bool {
        self.content.is_some()
    }

    pub fn state(&self) -> EntityState {
        match (&self.source, &self.content, self.freshness) {
            (None, _, _) => EntityState::Uninitialized,
            (Some(_), Some(_), _) => EntityState::ContentResolved,
            (Some(_), None, Some(Freshness::Valid)) => EntityState::CacheValid,
            (Some(_), None, _) => EntityState::CacheStaleOrMissing,
        }
    }

    /// Whether the document's fingerprint differs from `fingerprint`.
    ///
    /// An entity without metadata counts as changed.
    pub fn has_changed(&self, fingerprint: &str) -> bool {
        self.fingerprint() != Some(fingerprint)
    }

    /// Fetch metadata and make sure the store holds current content.
    ///
    /// When the store has content and its fingerprint matches, nothing is
    /// downloaded or written and the content is read from the store on demand.
    /// Otherwise the content is downloaded now and stored together with the
    /// new fingerprint before this returns.
    pub fn preload_sync(&mut self) -> Result<(), Error> {
        self.reset();
        let metadata = self.ctx.client().fetch_metadata(&self.file_id)?;

        let content_key = content_descriptor(&self.file_id, &self.mime_type);
        let stored = if self.ctx.store().contains(&content_key, PayloadKind::Bytes) {
            self.ctx.fingerprints().get(&fingerprint_descriptor(&self.file_id))?
        } else {
            None
        };

        if stored.as_deref() == Some(metadata.fingerprint.as_str()) {
            tracing::debug!(file_id = %self.file_id, mime_type = %self.mime_type, "cache valid");
            self.freshness = Some(Freshness::Valid);
            self.source = Some(ContentSource::CacheRead);
        } else {
            tracing::debug!(file_id = %self.file_id, mime_type = %self.mime_type, "cache stale, fetching");
            let export_link = metadata.export_link(&self.mime_type).map(str::to_string);
            let content = self.download(export_link.as_deref())?;
            self.persist(&metadata, &content)?;
            self.freshness = Some(Freshness::StaleOrMissing);
            self.source = Some(ContentSource::NetworkFetch { export_link });
            self.content = Some(content);
        }

        self.metadata = Some(metadata);
        self.strategy = Some(Strategy::Eager);
        Ok(())
    }

    /// Fetch metadata and compare fingerprints, leaving content and store
    /// alone.
    ///
    /// The content is read on the first [`get_content`](Self::get_content);
    /// the store is only written by [`commit`](Self::commit).
    pub fn preload_deferred(&mut self) -> Result<(), Error> {
        self.reset();
        let metadata = self.ctx.client().fetch_metadata(&self.file_id)?;
        let stored = self.ctx.fingerprints().get(&fingerprint_descriptor(&self.file_id))?;

        if stored.as_deref() == Some(metadata.fingerprint.as_str()) {
            self.freshness = Some(Freshness::Valid);
            self.source = Some(ContentSource::CacheRead);
        } else {
            let export_link = metadata.export_link(&self.mime_type).map(str::to_string);
            self.freshness = Some(Freshness::StaleOrMissing);
            self.source = Some(ContentSource::NetworkFetch { export_link });
        }
        tracing::debug!(file_id = %self.file_id, freshness = ?self.freshness, "deferred preload");

        self.metadata = Some(metadata);
        self.strategy = Some(Strategy::Deferred);
        Ok(())
    }

    /// Populate from the store only, without touching the network.
    ///
    /// # Errors
    ///
    /// `CacheMiss` if the metadata record or the content is not stored.
    pub fn preload_from_cache(&mut self) -> Result<(), Error> {
        self.reset();
        let metadata: Metadata = self
            .ctx
            .store()
            .get_structured(&metadata_descriptor(&self.file_id))?
            .ok_or_else(|| Error::CacheMiss(format!("no cached metadata for {}", self.file_id)))?;

        if !self
            .ctx
            .store()
            .contains(&content_descriptor(&self.file_id, &self.mime_type), PayloadKind::Bytes)
        {
            return Err(Error::CacheMiss(format!("no cached {} content for {}", self.mime_type, self.file_id)));
        }

        self.metadata = Some(metadata);
        self.freshness = Some(Freshness::Valid);
        self.source = Some(ContentSource::CacheRead);
        self.strategy = Some(Strategy::CacheOnly);
        Ok(())
    }

    /// The document content, read at most once per preload.
    pub fn get_content(&mut self) -> Result<Bytes, Error> {
        if let Some(content) = &self.content {
            return Ok(content.clone());
        }
        let Some(source) = self.source.clone() else {
            return Err(Error::NotPreloaded(self.file_id.clone()));
        };

        let content = match source {
            ContentSource::CacheRead => {
                let key = content_descriptor(&self.file_id, &self.mime_type);
                match self.ctx.store().get_bytes(&key)? {
                    Some(bytes) => Bytes::from(bytes),
                    None if self.strategy == Some(Strategy::Deferred) => {
                        tracing::warn!(file_id = %self.file_id, "cached content vanished, fetching");
                        // The store changed behind our back; reread the fingerprint next time.
                        self.ctx.fingerprints().forget(&fingerprint_descriptor(&self.file_id));
                        let export_link = self.metadata.as_ref().and_then(|m| m.export_link(&self.mime_type));
                        let content = self.download(export_link)?;
                        self.freshness = Some(Freshness::StaleOrMissing);
                        self.unsaved = true;
                        content
                    }
                    None => {
                        return Err(Error::CacheMiss(format!("no cached {} content for {}", self.mime_type, self.file_id)));
                    }
                }
            }
            ContentSource::NetworkFetch { export_link } => {
                let content = self.download(export_link.as_deref())?;
                self.unsaved = true;
                content
            }
        };

        self.content = Some(content.clone());
        Ok(content)
    }

    /// Persist content fetched by a deferred preload.
    ///
    /// Does nothing when the cache was valid or nothing was downloaded.
    /// Write failures are logged and reported as [`CommitOutcome::Failed`].
    pub fn commit(&mut self) -> CommitOutcome {
        if self.freshness != Some(Freshness::StaleOrMissing) {
            return CommitOutcome::Skipped;
        }
        if !self.unsaved {
            return if self.content.is_none() { CommitOutcome::NothingFetched } else { CommitOutcome::Skipped };
        }
        let (Some(metadata), Some(content)) = (&self.metadata, &self.content) else {
            return CommitOutcome::NothingFetched;
        };

        match self.persist(metadata, content) {
            Ok(()) => {
                self.unsaved = false;
                tracing::debug!(file_id = %self.file_id, bytes = content.len(), "committed");
                CommitOutcome::Persisted
            }
            Err(e) => {
                tracing::warn!(file_id = %self.file_id, error = %e, "commit failed");
                CommitOutcome::Failed
            }
        }
    }

    fn download(&self, export_link: Option<&str>) -> Result<Bytes, Error> {
        tracing::debug!(">> fetching {}: {}", self.mime_type, self.file_id);
        match export_link {
            Some(link) => self.ctx.client().fetch_by_link(link),
            None => self.ctx.client().fetch_content(&self.file_id, &self.mime_type),
        }
    }

    /// Write content first and the fingerprint last, so a partial write never
    /// pairs a new fingerprint with old content.
    fn persist(&self, metadata: &Metadata, content: &[u8]) -> Result<(), Error> {
        let store = self.ctx.store();
        store.put_bytes(&content_descriptor(&self.file_id, &self.mime_type), content)?;
        store.put_structured(&metadata_descriptor(&self.file_id), metadata)?;
        self.ctx
            .fingerprints()
            .put(&fingerprint_descriptor(&self.file_id), &metadata.fingerprint)
    }

    fn reset(&mut self) {
        self.metadata = None;
        self.strategy = None;
        self.freshness = None;
        self.source = None;
        self.content = None;
        self.unsaved = false;
    }
}

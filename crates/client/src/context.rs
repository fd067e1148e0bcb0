//! Shared state for entity access: the store, the fingerprint cache and the
//! files API client.

use crate::drive::{DriveClient, DriveConfig};
use crate::entity::CachedEntity;
use crate::transport::{HttpTransport, Transport, TransportConfig};
use docstash_core::{AppConfig, BlobStore, Error, FingerprintCache};

/// Owns everything a [`CachedEntity`] needs.
///
/// Entities borrow the context, so one context serves many documents. The
/// fingerprint cache is not thread-safe; use one context per thread.
pub struct DocContext<T = HttpTransport> {
    store: BlobStore,
    fingerprints: FingerprintCache,
    client: DriveClient<T>,
}

impl DocContext<HttpTransport> {
    /// Build a context talking to the real files API.
    ///
    /// A missing access token is not an error here: cache-only reads work
    /// without one, and network calls fail with the server's 401.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        if config.access_token.is_none() {
            tracing::debug!("no access token configured, network calls will be unauthenticated");
        }
        let transport = HttpTransport::new(TransportConfig {
            user_agent: config.user_agent.clone(),
            access_token: config.access_token.clone(),
            ..Default::default()
        });
        let client = DriveClient::new(transport, DriveConfig::from(config))?;
        let store = BlobStore::new(config.resolved_store_dir());
        tracing::debug!("blob store at {}", store.root().display());
        Ok(Self::new(store, client))
    }
}

impl<T: Transport> DocContext<T> {
    pub fn new(store: BlobStore, client: DriveClient<T>) -> Self {
        let fingerprints = FingerprintCache::new(store.clone());
        Self { store, fingerprints, client }
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn fingerprints(&self) -> &FingerprintCache {
        &self.fingerprints
    }

    pub fn client(&self) -> &DriveClient<T> {
        &self.client
    }

    /// An unloaded entity for `file_id` exported as `mime_type`.
    pub fn entity(&self, file_id: impl Into<String>, mime_type: impl Into<String>) -> CachedEntity<'_, T> {
        CachedEntity::new(self, file_id.into(), mime_type.into())
    }
}

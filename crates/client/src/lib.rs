//! Client code for docstash.
//!
//! This crate provides the authenticated transport, the files API client with
//! its retry policy, and the per-document cache controller built on top of
//! the core store.

pub mod context;
pub mod drive;
pub mod entity;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use context::DocContext;
pub use drive::{DriveClient, DriveConfig, FileResource, RetryPolicy, compute_fingerprint};
pub use entity::{CachedEntity, CommitOutcome, ContentSource, EntityState, Freshness, Strategy};
pub use transport::{HttpTransport, Transport, TransportConfig};

//! Filesystem-backed cache for opaque payloads.
//!
//! This module provides a descriptor-keyed store on the local filesystem:
//!
//! - Keys are the SHA-1 of a caller-chosen descriptor plus a type suffix
//! - Raw bytes, UTF-8 strings and JSON-encoded structured values
//! - A write-through in-memory layer for short strings (fingerprints)
//!
//! There is no eviction and no cross-process locking.

pub mod blobs;
pub mod fingerprints;
pub mod hash;

pub use crate::Error;

pub use blobs::BlobStore;
pub use fingerprints::FingerprintCache;
pub use hash::{PayloadKind, compute_storage_key};

//! Write-through, read-cached store for short strings such as fingerprints.

use std::cell::RefCell;
use std::collections::HashMap;

use super::blobs::BlobStore;
use crate::Error;

/// In-memory view over the string payloads of a [`BlobStore`].
///
/// Reads go to memory first and fall back to the store; writes go to the
/// store first and only then to memory, so memory is never ahead of disk.
/// Meant for short values (hashes, names); nothing enforces that.
///
/// The map sits in a `RefCell`, which makes this type `!Sync`: one thread
/// owns it at a time.
#[derive(Debug)]
pub struct FingerprintCache {
    store: BlobStore,
    memory: RefCell<HashMap<String, String>>,
}

impl FingerprintCache {
    pub fn new(store: BlobStore) -> Self {
        Self { store, memory: RefCell::new(HashMap::new()) }
    }

    /// The backing store.
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    pub fn put(&self, descriptor: &str, value: &str) -> Result<(), Error> {
        tracing::trace!("fingerprint >> [{descriptor}] = {value}");
        self.store.put_string(descriptor, value)?;
        self.memory
            .borrow_mut()
            .insert(descriptor.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, descriptor: &str) -> Result<Option<String>, Error> {
        if let Some(value) = self.memory.borrow().get(descriptor) {
            return Ok(Some(value.clone()));
        }

        let value = self.store.get_string(descriptor)?;
        tracing::trace!("fingerprint << [{descriptor}] = {value:?}");
        if let Some(v) = &value {
            self.memory.borrow_mut().insert(descriptor.to_string(), v.clone());
        }
        Ok(value)
    }

    /// Drop the in-memory copy of one entry; the next read goes to the store.
    pub fn forget(&self, descriptor: &str) {
        self.memory.borrow_mut().remove(descriptor);
    }

    /// Number of entries currently held in memory.
    pub fn cached_len(&self) -> usize {
        self.memory.borrow().len()
    }
}

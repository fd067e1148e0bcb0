//! Blob store operations.
//!
//! Each value is one file directly under the store root, named after the
//! descriptor's storage key. Writes replace the whole file; there is no
//! versioning and the last write wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::hash::{PayloadKind, compute_storage_key};
use crate::Error;

/// Filesystem blob store keyed by opaque descriptors.
///
/// Cloning is cheap and every clone addresses the same directory.
#[derive(Clone, Debug)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a store rooted at `root`.
    ///
    /// The directory is created on first write, not here.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds (or would hold) the payload for a descriptor.
    pub fn path_for(&self, descriptor: &str, kind: PayloadKind) -> PathBuf {
        self.root.join(compute_storage_key(descriptor, kind))
    }

    /// Whether a payload of the given kind was ever written for a descriptor.
    pub fn contains(&self, descriptor: &str, kind: PayloadKind) -> bool {
        self.path_for(descriptor, kind).is_file()
    }

    pub fn put_bytes(&self, descriptor: &str, content: &[u8]) -> Result<(), Error> {
        self.store(descriptor, PayloadKind::Bytes, content)
    }

    pub fn get_bytes(&self, descriptor: &str) -> Result<Option<Vec<u8>>, Error> {
        self.retrieve(descriptor, PayloadKind::Bytes)
    }

    pub fn put_string(&self, descriptor: &str, content: &str) -> Result<(), Error> {
        self.store(descriptor, PayloadKind::String, content.as_bytes())
    }

    /// Read a UTF-8 string payload.
    ///
    /// A file that is not valid UTF-8 is reported as [`Error::Encoding`].
    pub fn get_string(&self, descriptor: &str) -> Result<Option<String>, Error> {
        let Some(bytes) = self.retrieve(descriptor, PayloadKind::String)? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| Error::Encoding { descriptor: descriptor.to_string(), reason: e.to_string() })
    }

    /// Serialize a value as pretty-printed JSON and store it.
    pub fn put_structured<T: Serialize + ?Sized>(&self, descriptor: &str, value: &T) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| Error::Encoding { descriptor: descriptor.to_string(), reason: e.to_string() })?;
        self.store(descriptor, PayloadKind::Structured, &bytes)
    }

    /// Read a structured value back into `T`.
    pub fn get_structured<T: DeserializeOwned>(&self, descriptor: &str) -> Result<Option<T>, Error> {
        let Some(bytes) = self.retrieve(descriptor, PayloadKind::Structured)? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| Error::Encoding { descriptor: descriptor.to_string(), reason: e.to_string() })
    }

    fn store(&self, descriptor: &str, kind: PayloadKind, content: &[u8]) -> Result<(), Error> {
        fs::create_dir_all(&self.root).map_err(|e| Error::storage(&self.root, e))?;

        let path = self.path_for(descriptor, kind);
        let staging = path.with_extension("tmp");
        let written = fs::write(&staging, content)
            .map_err(|e| Error::storage(&staging, e))
            .and_then(|()| fs::rename(&staging, &path).map_err(|e| Error::storage(&path, e)));
        if let Err(e) = written {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        tracing::trace!("stored {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn retrieve(&self, descriptor: &str, kind: PayloadKind) -> Result<Option<Vec<u8>>, Error> {
        let path = self.path_for(descriptor, kind);
        match fs::read(&path) {
            Ok(content) => {
                tracing::trace!("read {} bytes from {}", content.len(), path.display());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        field_a: String,
        field_b: i32,
    }

    fn make_store() -> (tempfile::TempDir, BlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("blob_store"));
        (dir, store)
    }

    #[test]
    fn test_bytes_roundtrip() {
        let (_dir, store) = make_store();
        assert_eq!(store.get_bytes("key").unwrap(), None);

        store.put_bytes("key", &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.get_bytes("key").unwrap(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_string_roundtrip() {
        let (_dir, store) = make_store();
        assert_eq!(store.get_string("key").unwrap(), None);

        store.put_string("key", "content é").unwrap();
        assert_eq!(store.get_string("key").unwrap().as_deref(), Some("content é"));
    }

    #[test]
    fn test_structured_roundtrip() {
        let (_dir, store) = make_store();
        let value = Sample { field_a: "The answer is".into(), field_b: 42 };
        assert_eq!(store.get_structured::<Sample>("key").unwrap(), None);

        store.put_structured("key", &value).unwrap();
        assert_eq!(store.get_structured::<Sample>("key").unwrap(), Some(value));
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let (_dir, store) = make_store();
        store.put_string("key", "first").unwrap();
        store.put_string("key", "second").unwrap();
        assert_eq!(store.get_string("key").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_kinds_do_not_alias() {
        let (_dir, store) = make_store();
        store.put_string("key", "text").unwrap();
        assert_eq!(store.get_bytes("key").unwrap(), None);
        assert!(store.contains("key", PayloadKind::String));
        assert!(!store.contains("key", PayloadKind::Bytes));
    }

    #[test]
    fn test_flat_layout() {
        let (_dir, store) = make_store();
        store.put_bytes("doc-42", b"abc").unwrap();

        let path = store.path_for("doc-42", PayloadKind::Bytes);
        assert_eq!(path.parent(), Some(store.root()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(compute_storage_key("doc-42", PayloadKind::Bytes).as_str())
        );

        let entries: Vec<_> = fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_root_is_absence() {
        let dir = tempfile::tempdir().unwrap();
        let store = BlobStore::new(dir.path().join("never").join("created"));
        assert_eq!(store.get_bytes("key").unwrap(), None);
        assert_eq!(store.get_string("key").unwrap(), None);
        assert_eq!(store.get_structured::<Sample>("key").unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let (_dir, store) = make_store();
        store.put_string("key", "placeholder").unwrap();
        fs::write(store.path_for("key", PayloadKind::String), [0xff, 0xfe]).unwrap();

        let result = store.get_string("key");
        assert!(matches!(result, Err(Error::Encoding { .. })));
    }

    #[test]
    fn test_root_is_a_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("occupied");
        fs::write(&root, b"not a directory").unwrap();
        let store = BlobStore::new(&root);

        let result = store.put_bytes("key", b"abc");
        assert!(matches!(result, Err(Error::Storage { .. })));
    }

    #[test]
    fn test_failed_write_leaves_no_staging_file() {
        let (_dir, store) = make_store();
        store.put_bytes("other", b"x").unwrap();
        // A non-empty directory where the value file belongs makes the rename fail.
        let target = store.path_for("key", PayloadKind::Bytes);
        fs::create_dir(&target).unwrap();
        fs::write(target.join("occupant"), b"x").unwrap();

        let result = store.put_bytes("key", b"abc");

        assert!(matches!(result, Err(Error::Storage { .. })));
        assert!(!target.with_extension("tmp").exists());
    }
}

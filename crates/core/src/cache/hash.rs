//! Descriptor-derived storage keys.

use sha1::{Digest, Sha1};

/// The shape of a stored payload, encoded as a one-letter key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Bytes,
    String,
    Structured,
}

impl PayloadKind {
    pub fn suffix(self) -> &'static str {
        match self {
            PayloadKind::Bytes => "b",
            PayloadKind::String => "s",
            PayloadKind::Structured => "j",
        }
    }
}

/// Compute the storage key for a descriptor: hex SHA-1 of the descriptor
/// followed by the payload suffix.
pub fn compute_storage_key(descriptor: &str, kind: PayloadKind) -> String {
    let mut key = hex::encode(Sha1::digest(descriptor.as_bytes()));
    key.push_str(kind.suffix());
    key
}

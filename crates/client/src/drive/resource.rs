//! Files API response types and fingerprint construction.

use std::collections::BTreeMap;

use serde::Deserialize;
use sha1::{Digest, Sha1};

use docstash_core::Metadata;

/// Fields requested from the files API.
///
/// The API answers with almost nothing when no field list is given, so the
/// list is always explicit. Some fields may still be missing from the answer
/// (native documents have no md5 checksum).
pub const METADATA_FIELDS: &str = "md5Checksum,modifiedTime,version,name,exportLinks";

/// Stand-in for an input the server did not send.
pub const MISSING_FIELD: &str = "null";

/// Raw file resource from the files API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResource {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub modified_time: Option<String>,
    #[serde(default)]
    pub md5_checksum: Option<String>,
    #[serde(default)]
    pub export_links: Option<BTreeMap<String, String>>,
}

impl FileResource {
    /// Fingerprint over the fields that move when the content changes.
    pub fn fingerprint(&self) -> String {
        compute_fingerprint(self.version.as_deref(), self.modified_time.as_deref(), self.md5_checksum.as_deref())
    }
}

impl From<FileResource> for Metadata {
    fn from(raw: FileResource) -> Self {
        let fingerprint = raw.fingerprint();
        Metadata {
            title: raw.name.unwrap_or_default(),
            fingerprint,
            export_links: raw.export_links.unwrap_or_default(),
        }
    }
}

/// Compute a content fingerprint from version, modification time and checksum.
///
/// The canonical form is `v:{version}|d:{modified}|c:{checksum}`, hashed with
/// SHA-1 and hex encoded. Missing inputs render as [`MISSING_FIELD`] so the
/// format never shifts.
pub fn compute_fingerprint(version: Option<&str>, modified_time: Option<&str>, checksum: Option<&str>) -> String {
    let canonical = format!(
        "v:{}|d:{}|c:{}",
        version.unwrap_or(MISSING_FIELD),
        modified_time.unwrap_or(MISSING_FIELD),
        checksum.unwrap_or(MISSING_FIELD)
    );
    hex::encode(Sha1::digest(canonical.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_JSON: &str = r#"{
        "name": "Izumi Index",
        "version": "1042",
        "modifiedTime": "2024-05-01T10:00:00.000Z",
        "exportLinks": {
            "text/html": "https://docs.example.com/export?id=abc&exportFormat=html",
            "application/pdf": "https://docs.example.com/export?id=abc&exportFormat=pdf"
        }
    }"#;

    #[test]
    fn test_deserialize_file_resource() {
        let raw: FileResource = serde_json::from_str(FIXTURE_JSON).unwrap();
        assert_eq!(raw.name.as_deref(), Some("Izumi Index"));
        assert_eq!(raw.version.as_deref(), Some("1042"));
        assert_eq!(raw.md5_checksum, None);
        assert_eq!(raw.export_links.as_ref().map(|l| l.len()), Some(2));
    }

    #[test]
    fn test_into_metadata() {
        let raw: FileResource = serde_json::from_str(FIXTURE_JSON).unwrap();
        let expected = compute_fingerprint(Some("1042"), Some("2024-05-01T10:00:00.000Z"), None);
        let meta: Metadata = raw.into();

        assert_eq!(meta.title, "Izumi Index");
        assert_eq!(meta.fingerprint, expected);
        assert_eq!(
            meta.export_link("text/html"),
            Some("https://docs.example.com/export?id=abc&exportFormat=html")
        );
    }

    #[test]
    fn test_empty_resource() {
        let meta: Metadata = serde_json::from_str::<FileResource>("{}").unwrap().into();
        assert_eq!(meta.title, "");
        assert!(meta.export_links.is_empty());
        assert_eq!(meta.fingerprint, compute_fingerprint(None, None, None));
    }

    #[test]
    fn test_fingerprint_canonical_form() {
        let expected = hex::encode(Sha1::digest(b"v:7|d:2024-01-01T00:00:00Z|c:null"));
        assert_eq!(compute_fingerprint(Some("7"), Some("2024-01-01T00:00:00Z"), None), expected);
    }

    #[test]
    fn test_fingerprint_tracks_each_input() {
        let base = compute_fingerprint(Some("7"), Some("t1"), Some("c1"));
        assert_eq!(base, compute_fingerprint(Some("7"), Some("t1"), Some("c1")));
        assert_ne!(base, compute_fingerprint(Some("8"), Some("t1"), Some("c1")));
        assert_ne!(base, compute_fingerprint(Some("7"), Some("t2"), Some("c1")));
        assert_ne!(base, compute_fingerprint(Some("7"), Some("t1"), Some("c2")));
        assert_ne!(base, compute_fingerprint(None, Some("t1"), Some("c1")));
    }

    #[test]
    fn test_fingerprint_format() {
        let fp = compute_fingerprint(None, None, None);
        assert_eq!(fp.len(), 40);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

//! Results of reading a path through the virtual filesystem

use std::collections::{BTreeMap, HashMap};

use jiff::Timestamp;
use serde::Serialize;

use crate::traits::ObjectInfo;

/// Prefix S3-compatible stores put in front of user metadata keys
const USER_METADATA_PREFIX: &str = "x-amz-meta-";

/// Payload of an [`ObjectData`], depending on what the path addressed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ObjectKind {
    /// A regular object and its content
    File {
        #[serde(skip)]
        data: Vec<u8>,
    },
    /// A directory; its only trace in the store is a marker or a prefix
    Folder,
}

/// A file or folder read through [`crate::fs::VirtualFs::get`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectData {
    /// Base name; folders keep their trailing slash
    pub name: String,
    /// Normalized absolute path the entry was read from
    pub full_path: String,
    /// User metadata, keys lower-cased with the store prefix stripped
    pub metadata: BTreeMap<String, String>,
    pub is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
    pub size: i64,
    #[serde(flatten)]
    pub kind: ObjectKind,
}

impl ObjectData {
    /// Build a file result from its stat info and content
    pub fn file(
        name: impl Into<String>,
        full_path: impl Into<String>,
        info: ObjectInfo,
        data: Vec<u8>,
    ) -> Self {
        Self::from_info(name.into(), full_path.into(), info, ObjectKind::File { data })
    }

    /// Build a folder result from its listing entry
    pub fn folder(name: impl Into<String>, full_path: impl Into<String>, info: ObjectInfo) -> Self {
        let mut folder = Self::from_info(name.into(), full_path.into(), info, ObjectKind::Folder);
        folder.is_dir = true;
        folder
    }

    fn from_info(name: String, full_path: String, info: ObjectInfo, kind: ObjectKind) -> Self {
        Self {
            name,
            full_path,
            metadata: normalize_metadata(&info.metadata),
            is_dir: info.is_dir,
            last_modified: info.last_modified,
            size: info.size_bytes.unwrap_or(0),
            kind,
        }
    }

    /// File content, `None` for folders
    pub fn data(&self) -> Option<&[u8]> {
        match &self.kind {
            ObjectKind::File { data } => Some(data),
            ObjectKind::Folder => None,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, ObjectKind::File { .. })
    }
}

/// Lower-case metadata keys and strip the `X-Amz-Meta-` prefix stores add
pub fn normalize_metadata(raw: &HashMap<String, String>) -> BTreeMap<String, String> {
    raw.iter()
        .map(|(key, value)| {
            let key = key.to_lowercase();
            let key = key
                .strip_prefix(USER_METADATA_PREFIX)
                .map(str::to_string)
                .unwrap_or(key);
            (key, value.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_metadata() {
        let raw = HashMap::from([
            ("X-Amz-Meta-Owner".to_string(), "alice".to_string()),
            ("Content-Kind".to_string(), "report".to_string()),
            ("x-amz-meta-lower".to_string(), "yes".to_string()),
        ]);

        let metadata = normalize_metadata(&raw);
        assert_eq!(metadata.get("owner").map(String::as_str), Some("alice"));
        assert_eq!(metadata.get("content-kind").map(String::as_str), Some("report"));
        assert_eq!(metadata.get("lower").map(String::as_str), Some("yes"));
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn test_file_data() {
        let info = ObjectInfo::file("foo/bar", 4);
        let file = ObjectData::file("bar", "/b/foo/bar", info, b"test".to_vec());
        assert!(file.is_file());
        assert!(!file.is_dir);
        assert_eq!(file.size, 4);
        assert_eq!(file.data(), Some(&b"test"[..]));
    }

    #[test]
    fn test_folder_has_no_data() {
        let folder = ObjectData::folder("bar/", "/b/bar/", ObjectInfo::dir("bar/"));
        assert!(!folder.is_file());
        assert!(folder.is_dir);
        assert_eq!(folder.size, 0);
        assert!(folder.data().is_none());
    }

    #[test]
    fn test_serialize_skips_content() {
        let file = ObjectData::file("bar", "/b/bar", ObjectInfo::file("bar", 4), b"test".to_vec());
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(json["kind"], "file");
        assert_eq!(json["name"], "bar");
        assert!(json.get("data").is_none());
    }
}

//! ObjectStore trait definition
//!
//! This trait is the only boundary between the virtual directory engine and
//! an S3-compatible store. It speaks in buckets and flat keys; everything
//! directory-like is built on top of it in [`crate::fs`].

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for an object, a common prefix or a bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key, common prefix, or bucket name
    pub key: String,

    /// Size in bytes (None for prefixes and buckets)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp, or creation date for buckets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// User metadata as reported by the store
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Whether this is a directory/prefix
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for a file
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_type: None,
            metadata: HashMap::new(),
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a directory/prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
            metadata: HashMap::new(),
            is_dir: true,
        }
    }

    /// Create a new ObjectInfo for a bucket
    pub fn bucket(name: impl Into<String>, created: Option<Timestamp>) -> Self {
        Self {
            last_modified: created,
            ..Self::dir(name)
        }
    }

    /// Sort key used for "most recent first" ordering
    ///
    /// Entries without a timestamp sort as the Unix epoch.
    pub fn modified_or_epoch(&self) -> Timestamp {
        self.last_modified.unwrap_or(Timestamp::UNIX_EPOCH)
    }
}

/// Which entries a directory listing should return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFilter {
    /// Files and directories
    #[default]
    All,
    /// Only files
    FilesOnly,
    /// Only directories
    DirsOnly,
}

impl ListFilter {
    pub fn accepts(self, is_dir: bool) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::FilesOnly => !is_dir,
            ListFilter::DirsOnly => is_dir,
        }
    }
}

/// Options for put operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    /// User metadata stored alongside the object
    pub metadata: HashMap<String, String>,

    /// Content type of the object
    pub content_type: Option<String>,
}

/// HTTP method a presigned URL is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Put,
    Delete,
}

/// Trait for S3-compatible storage operations
///
/// Implemented by the S3 adapter and by [`crate::memory::MemoryStore`];
/// mocked in unit tests. Implementations report a missing bucket or key as
/// `Error::NotFound` and a non-empty bucket removal as
/// `Error::BucketNotEmpty`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List buckets, with their creation date in `last_modified`
    async fn list_buckets(&self) -> Result<Vec<ObjectInfo>>;

    /// Check if a bucket exists
    async fn bucket_exists(&self, bucket: &str) -> Result<bool>;

    /// Create a bucket
    async fn make_bucket(&self, bucket: &str) -> Result<()>;

    /// Delete an empty bucket
    async fn remove_bucket(&self, bucket: &str) -> Result<()>;

    /// List objects under `prefix`
    ///
    /// Non-recursive listings group deeper keys into common prefixes
    /// (returned with `is_dir = true`) and include an object whose key equals
    /// `prefix` itself. All pages are collected.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> Result<Vec<ObjectInfo>>;

    /// Get object metadata
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo>;

    /// Get object content as bytes
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Store `data` under `key`, replacing any existing object
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Vec<u8>,
        options: PutOptions,
    ) -> Result<()>;

    /// Delete a single object. Deleting a missing key is not an error.
    async fn remove_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Delete a batch of objects, returning the keys that were deleted
    async fn remove_objects(&self, bucket: &str, keys: Vec<String>) -> Result<Vec<String>>;

    /// Server-side copy
    async fn copy_object(
        &self,
        src_bucket: &str,
        src_key: &str,
        dst_bucket: &str,
        dst_key: &str,
    ) -> Result<()>;

    /// Build a presigned URL for `method` on an object
    async fn presign(
        &self,
        method: PresignMethod,
        bucket: &str,
        key: &str,
        expires: Duration,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_info_file() {
        let info = ObjectInfo::file("test.txt", 1024);
        assert_eq!(info.key, "test.txt");
        assert_eq!(info.size_bytes, Some(1024));
        assert_eq!(info.size_human.as_deref(), Some("1 KiB"));
        assert!(!info.is_dir);
    }

    #[test]
    fn test_object_info_dir() {
        let info = ObjectInfo::dir("path/to/dir/");
        assert_eq!(info.key, "path/to/dir/");
        assert!(info.is_dir);
        assert!(info.size_bytes.is_none());
        assert_eq!(info.modified_or_epoch(), Timestamp::UNIX_EPOCH);
    }

    #[test]
    fn test_object_info_bucket() {
        let created = Timestamp::from_second(1_700_000_000).unwrap();
        let info = ObjectInfo::bucket("my-bucket", Some(created));
        assert_eq!(info.key, "my-bucket");
        assert!(info.is_dir);
        assert_eq!(info.modified_or_epoch(), created);
    }

    #[test]
    fn test_list_filter() {
        assert!(ListFilter::All.accepts(true));
        assert!(ListFilter::All.accepts(false));
        assert!(ListFilter::FilesOnly.accepts(false));
        assert!(!ListFilter::FilesOnly.accepts(true));
        assert!(ListFilter::DirsOnly.accepts(true));
        assert!(!ListFilter::DirsOnly.accepts(false));
    }
}

//! Virtual directory engine
//!
//! [`VirtualFs`] gives an S3-compatible store a directory tree. A directory
//! is a zero-length marker object whose key ends with `/` (or just a shared
//! key prefix), a bucket is a top-level directory, and `/` contains the
//! buckets. Every operation parses its paths first, dispatches on what they
//! address, and then talks to the [`ObjectStore`] one call at a time.
//!
//! Nothing is cached: the store is re-queried on every call.

use std::cmp::Reverse;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::object::ObjectData;
use crate::path::{PathMatch, require_directory, require_file};
use crate::traits::{ListFilter, ObjectInfo, ObjectStore, PresignMethod, PutOptions};

/// Filesystem-style view over an object store
#[derive(Clone)]
pub struct VirtualFs {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for VirtualFs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualFs").finish_non_exhaustive()
    }
}

fn missing(path: &PathMatch) -> Error {
    Error::NotFound(format!(
        "cannot access '{path}': No such file or directory"
    ))
}

/// Replace a store-level not-found with one naming the virtual path
fn or_missing(err: Error, path: &PathMatch) -> Error {
    if err.is_not_found() {
        missing(path)
    } else {
        err
    }
}

/// Map `entry`, which lies under `from`, to the same place under `to`
fn rebase(entry: &PathMatch, from: &PathMatch, to: &PathMatch) -> Result<PathMatch> {
    let suffix = entry.path().strip_prefix(from.path()).unwrap_or_default();
    PathMatch::parse(&format!("{}{suffix}", to.path()))
}

impl VirtualFs {
    /// Create an engine over `store`
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// The underlying object store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Create a directory, creating its bucket first if needed
    ///
    /// Idempotent. Only the marker of the last level is written; parents
    /// show up as common prefixes when their parent is listed.
    pub async fn mkdirs(&self, path: &str) -> Result<()> {
        let dir = require_directory(path)?;
        self.make_dir(&dir).await
    }

    async fn make_dir(&self, dir: &PathMatch) -> Result<()> {
        if dir.is_root() {
            return Err(Error::InvalidRootOperation(
                "cannot create the root directory".into(),
            ));
        }

        self.ensure_bucket(dir.bucket()).await?;
        if dir.is_bucket() {
            return Ok(());
        }

        debug!(bucket = dir.bucket(), key = dir.prefix(), "writing directory marker");
        self.store
            .put_object(dir.bucket(), dir.prefix(), Vec::new(), PutOptions::default())
            .await?;
        info!(path = %dir, "directory created");
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<()> {
        debug!(bucket, "checking bucket");
        if self.store.bucket_exists(bucket).await? {
            return Ok(());
        }
        debug!(bucket, "creating bucket");
        match self.store.make_bucket(bucket).await {
            // Someone else created it in between
            Ok(()) | Err(Error::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Names of the entries directly inside a directory
    ///
    /// At root these are the buckets (newest first, each with a trailing
    /// `/`). Below root, entries are relative to the directory, directories
    /// keep their trailing `/`, and the most recently modified come first.
    pub async fn listdir(&self, path: &str, filter: ListFilter) -> Result<Vec<String>> {
        let dir = require_directory(path)?;

        if dir.is_root() {
            if filter == ListFilter::FilesOnly {
                return Ok(Vec::new());
            }
            let mut buckets = self.store.list_buckets().await?;
            buckets.sort_by_key(|b| Reverse(b.modified_or_epoch()));
            return Ok(buckets.into_iter().map(|b| format!("{}/", b.key)).collect());
        }

        let entries = self.entries_at(&dir).await?;
        Ok(entries
            .into_iter()
            .filter(|e| filter.accepts(e.is_dir))
            .map(|e| {
                e.key
                    .strip_prefix(dir.prefix())
                    .map(str::to_string)
                    .unwrap_or(e.key)
            })
            .collect())
    }

    /// Immediate children of `dir`, without its own marker, newest first
    async fn entries_at(&self, dir: &PathMatch) -> Result<Vec<ObjectInfo>> {
        debug!(bucket = dir.bucket(), prefix = dir.prefix(), "listing directory");
        let mut entries = self
            .store
            .list_objects(dir.bucket(), dir.prefix(), false)
            .await
            .map_err(|e| or_missing(e, dir))?;
        entries.retain(|e| e.key != dir.prefix());
        entries.sort_by_key(|e| Reverse(e.modified_or_epoch()));
        Ok(entries)
    }

    /// Whether a path exists
    ///
    /// Malformed paths do not exist. Errors other than "not found" (network,
    /// auth) are still reported.
    pub async fn exists(&self, path: &str) -> Result<bool> {
        match PathMatch::parse(path) {
            Ok(matched) => self.exists_match(&matched).await,
            Err(_) => Ok(false),
        }
    }

    async fn exists_match(&self, path: &PathMatch) -> Result<bool> {
        if path.is_root() {
            return Ok(true);
        }
        debug!(bucket = path.bucket(), "checking bucket");
        if !self.store.bucket_exists(path.bucket()).await? {
            return Ok(false);
        }
        if path.is_bucket() {
            return Ok(true);
        }
        match self.locate(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether a path exists and is a directory
    pub async fn isdir(&self, path: &str) -> Result<bool> {
        match PathMatch::parse(path) {
            Ok(matched) if matched.is_dir() => self.exists_match(&matched).await,
            _ => Ok(false),
        }
    }

    /// Store entry for a file or a non-bucket directory
    async fn locate(&self, path: &PathMatch) -> Result<ObjectInfo> {
        if path.is_file() {
            debug!(bucket = path.bucket(), key = %path.relative_path(), "stat object");
            self.store
                .stat_object(path.bucket(), &path.relative_path())
                .await
                .map_err(|e| or_missing(e, path))
        } else {
            self.find_directory_entry(path).await
        }
    }

    /// A directory has no object of its own to fetch, only an entry in the
    /// listing of its parent
    async fn find_directory_entry(&self, dir: &PathMatch) -> Result<ObjectInfo> {
        let key = dir.relative_path();
        debug!(bucket = dir.bucket(), prefix = dir.parent_prefix(), "listing parent");
        self.store
            .list_objects(dir.bucket(), dir.parent_prefix(), false)
            .await
            .map_err(|e| or_missing(e, dir))?
            .into_iter()
            .find(|e| e.key == key)
            .ok_or_else(|| missing(dir))
    }

    /// Remove a directory
    ///
    /// Without `recursive` the directory must be empty, and `/` is never
    /// removed. With it, all content goes first (files, then markers from
    /// the deepest up), then the directory itself or its bucket.
    pub async fn rmdir(&self, path: &str, recursive: bool) -> Result<()> {
        let dir = require_directory(path)?;
        if dir.is_root() {
            if !recursive {
                return Err(Error::DirectoryNotEmpty(
                    "refusing to remove '/' without recursive".into(),
                ));
            }
            return self.truncate().await;
        }
        self.remove_dir(&dir, recursive).await
    }

    async fn remove_dir(&self, dir: &PathMatch, recursive: bool) -> Result<()> {
        if !self.exists_match(dir).await? {
            return Err(missing(dir));
        }

        debug!(bucket = dir.bucket(), prefix = dir.prefix(), "listing descendants");
        let descendants: Vec<String> = self
            .store
            .list_objects(dir.bucket(), dir.prefix(), true)
            .await?
            .into_iter()
            .map(|e| e.key)
            .filter(|key| key != dir.prefix())
            .collect();

        if !descendants.is_empty() {
            if !recursive {
                return Err(Error::DirectoryNotEmpty(dir.to_string()));
            }
            self.remove_keys(dir.bucket(), descendants).await?;
        }

        if dir.is_bucket() {
            self.remove_bucket(dir, recursive).await?;
        } else {
            debug!(bucket = dir.bucket(), key = dir.prefix(), "removing directory marker");
            self.store.remove_object(dir.bucket(), dir.prefix()).await?;
        }
        info!(path = %dir, recursive, "directory removed");
        Ok(())
    }

    /// Delete files, then markers deepest first
    async fn remove_keys(&self, bucket: &str, keys: Vec<String>) -> Result<()> {
        let (mut markers, files): (Vec<String>, Vec<String>) =
            keys.into_iter().partition(|key| key.ends_with('/'));
        markers.sort_by_key(|key| Reverse(key.matches('/').count()));

        for batch in [files, markers] {
            if batch.is_empty() {
                continue;
            }
            let requested = batch.len();
            debug!(bucket, count = requested, "removing objects");
            let deleted = self.store.remove_objects(bucket, batch).await?;
            if deleted.len() < requested {
                warn!(
                    bucket,
                    requested,
                    deleted = deleted.len(),
                    "some objects were not removed"
                );
            }
        }
        Ok(())
    }

    async fn remove_bucket(&self, dir: &PathMatch, recursive: bool) -> Result<()> {
        let bucket = dir.bucket();
        let not_empty = |e: Error| match e {
            Error::BucketNotEmpty(_) => Error::DirectoryNotEmpty(dir.to_string()),
            other => other,
        };

        debug!(bucket, "removing bucket");
        match self.store.remove_bucket(bucket).await {
            Ok(()) => Ok(()),
            Err(Error::BucketNotEmpty(_)) if recursive => {
                warn!(bucket, "bucket still holds objects, sweeping again");
                let residual = self
                    .store
                    .list_objects(bucket, "", true)
                    .await?
                    .into_iter()
                    .map(|e| e.key)
                    .collect();
                self.remove_keys(bucket, residual).await?;
                self.store.remove_bucket(bucket).await.map_err(not_empty)
            }
            Err(e) => Err(not_empty(e)),
        }
    }

    /// Remove every bucket and everything in it
    pub async fn truncate(&self) -> Result<()> {
        let buckets = self.store.list_buckets().await?;
        for bucket in buckets {
            let dir = PathMatch::parse(&format!("/{}/", bucket.key))?;
            self.remove_dir(&dir, true).await?;
        }
        info!("all buckets removed");
        Ok(())
    }

    /// Remove a file, or a directory through [`VirtualFs::rmdir`]
    pub async fn rm(&self, path: &str, recursive: bool) -> Result<()> {
        let target = PathMatch::parse(path)?;
        if target.is_dir() {
            return self.rmdir(path, recursive).await;
        }

        self.locate(&target).await?;
        debug!(bucket = target.bucket(), key = %target.relative_path(), "removing object");
        self.store
            .remove_object(target.bucket(), &target.relative_path())
            .await?;
        info!(path = %target, "file removed");
        Ok(())
    }

    /// Copy a file or, with `recursive`, a directory tree
    ///
    /// Returns the path the source was copied to. A directory copied into an
    /// existing directory lands below it under its own name.
    pub async fn cp(&self, from: &str, to: &str, recursive: bool) -> Result<PathMatch> {
        let src = PathMatch::parse(from)?;
        let dst = PathMatch::parse(to)?;
        check_copy_source(&src, recursive)?;

        if !self.exists_match(&src).await? {
            return Err(missing(&src));
        }
        let dest = self.destination(&src, &dst).await?;
        self.copy_resolved(&src, &dest).await?;
        Ok(dest)
    }

    async fn destination(&self, src: &PathMatch, dst: &PathMatch) -> Result<PathMatch> {
        if src.is_file() {
            return PathMatch::infer_destination(src, dst);
        }
        if dst.is_file() {
            return Err(Error::InvalidOperation(format!(
                "cannot copy directory '{src}' to file path '{dst}'"
            )));
        }
        if self.exists_match(dst).await? {
            dst.child_dir(src.dir_name())
        } else {
            Ok(dst.clone())
        }
    }

    async fn copy_resolved(&self, src: &PathMatch, dest: &PathMatch) -> Result<()> {
        if src.is_dir() {
            return self.copy_tree(src, dest).await;
        }
        if src == dest {
            return Err(Error::InvalidOperation(format!(
                "'{src}' and '{dest}' are the same file"
            )));
        }

        debug!(from = %src, to = %dest, "copying object");
        self.store
            .copy_object(
                src.bucket(),
                &src.relative_path(),
                dest.bucket(),
                &dest.relative_path(),
            )
            .await?;
        info!(from = %src, to = %dest, "file copied");
        Ok(())
    }

    /// Copy the content of directory `from` into directory `to`
    ///
    /// To copy `from` as a folder, put its name at the end of `to`; missing
    /// directories on the way are created.
    pub async fn copy_recursively(&self, from: &str, to: &str) -> Result<()> {
        let src = require_directory(from)?;
        let dst = require_directory(to)?;
        if src.is_root() || dst.is_root() {
            return Err(Error::InvalidRootOperation(
                "cannot copy from or into the root directory".into(),
            ));
        }
        if !self.exists_match(&src).await? {
            return Err(missing(&src));
        }
        self.copy_tree(&src, &dst).await
    }

    /// Breadth-first walk of `src`, marking every destination directory
    /// before copying any file
    async fn copy_tree(&self, src: &PathMatch, dst: &PathMatch) -> Result<()> {
        if src.contains(dst) {
            return Err(Error::InvalidOperation(format!(
                "cannot copy '{src}' into itself ('{dst}')"
            )));
        }

        let mut queue = VecDeque::from([src.clone()]);
        let mut files = Vec::new();
        while let Some(dir) = queue.pop_front() {
            self.make_dir(&rebase(&dir, src, dst)?).await?;

            debug!(bucket = dir.bucket(), prefix = dir.prefix(), "listing directory");
            let children = self
                .store
                .list_objects(dir.bucket(), dir.prefix(), false)
                .await
                .map_err(|e| or_missing(e, &dir))?;
            for child in children.into_iter().filter(|c| c.key != dir.prefix()) {
                let child_path = PathMatch::parse(&format!("/{}/{}", dir.bucket(), child.key))?;
                if child.is_dir {
                    queue.push_back(child_path);
                } else {
                    files.push(child_path);
                }
            }
        }

        let total = files.len();
        for file in files {
            let target = rebase(&file, src, dst)?;
            debug!(from = %file, to = %target, "copying object");
            self.store
                .copy_object(
                    file.bucket(),
                    &file.relative_path(),
                    target.bucket(),
                    &target.relative_path(),
                )
                .await?;
        }
        info!(from = %src, to = %dst, files = total, "directory copied");
        Ok(())
    }

    /// Move a file or, with `recursive`, a directory tree
    ///
    /// The source is removed only once the copy succeeded and both source
    /// and destination are visible. Otherwise it is left in place.
    pub async fn mv(&self, from: &str, to: &str, recursive: bool) -> Result<PathMatch> {
        let src = PathMatch::parse(from)?;
        let dst = PathMatch::parse(to)?;
        check_copy_source(&src, recursive)?;

        if !self.exists_match(&src).await? {
            return Err(missing(&src));
        }
        let dest = self.destination(&src, &dst).await?;
        if let Err(e) = self.copy_resolved(&src, &dest).await {
            warn!(from = %src, to = %dest, error = %e, "copy failed, source left in place");
            return Err(e);
        }

        if self.exists_match(&src).await? && self.exists_match(&dest).await? {
            self.rm(src.path(), recursive).await?;
            info!(from = %src, to = %dest, "moved");
        } else {
            warn!(from = %src, to = %dest, "destination not visible after copy, source kept");
        }
        Ok(dest)
    }

    /// Read a file with its content, or a directory entry
    pub async fn get(&self, path: &str) -> Result<ObjectData> {
        let target = PathMatch::parse(path)?;
        if target.is_root() || target.is_bucket() {
            return Err(Error::InvalidOperation(format!(
                "'{target}' has no representable object"
            )));
        }

        if target.is_dir() {
            let entry = self.find_directory_entry(&target).await?;
            return Ok(ObjectData::folder(
                format!("{}/", target.dir_name()),
                target.path(),
                entry,
            ));
        }

        let info = self.locate(&target).await?;
        debug!(bucket = target.bucket(), key = %target.relative_path(), "reading object");
        let data = self
            .store
            .get_object(target.bucket(), &target.relative_path())
            .await
            .map_err(|e| or_missing(e, &target))?;
        Ok(ObjectData::file(target.filename(), target.path(), info, data))
    }

    /// Metadata of a bucket, directory or file, without content
    pub async fn info(&self, path: &str) -> Result<ObjectInfo> {
        let target = PathMatch::parse(path)?;
        if target.is_root() {
            return Err(Error::InvalidOperation("'/' has no metadata".into()));
        }
        if target.is_bucket() {
            return self
                .store
                .list_buckets()
                .await?
                .into_iter()
                .find(|b| b.key == target.bucket())
                .ok_or_else(|| missing(&target));
        }
        self.locate(&target).await
    }

    /// Write `data` to a file path
    pub async fn put_data(
        &self,
        path: &str,
        data: Vec<u8>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let target = require_file(path)?;
        self.write(&target, data, PutOptions {
            metadata,
            content_type: None,
        })
        .await
    }

    /// Upload a local file
    ///
    /// A directory destination keeps the local file name. Returns the path
    /// the file was written to.
    pub async fn put_file(
        &self,
        local: impl AsRef<Path>,
        to: &str,
        metadata: HashMap<String, String>,
    ) -> Result<PathMatch> {
        let local = local.as_ref();
        let dst = PathMatch::parse(to)?;
        if dst.is_root() {
            return Err(Error::InvalidRootOperation(
                "files cannot be stored in '/'".into(),
            ));
        }

        let target = if dst.is_dir() {
            let name = local
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    Error::InvalidPath(format!("'{}' has no file name", local.display()))
                })?;
            dst.child(name)?
        } else {
            dst
        };

        let data = tokio::fs::read(local).await?;
        let content_type = mime_guess::from_path(local).first_raw().map(str::to_string);
        self.write(&target, data, PutOptions {
            metadata,
            content_type,
        })
        .await?;
        Ok(target)
    }

    async fn write(&self, target: &PathMatch, data: Vec<u8>, options: PutOptions) -> Result<()> {
        let size = data.len();
        debug!(bucket = target.bucket(), key = %target.relative_path(), size, "writing object");
        self.store
            .put_object(target.bucket(), &target.relative_path(), data, options)
            .await
            .map_err(|e| or_missing(e, target))?;
        info!(path = %target, size, "file written");
        Ok(())
    }

    /// Most recently modified file in a directory, `None` if it has no files
    pub async fn get_last_object(&self, path: &str) -> Result<Option<ObjectData>> {
        let dir = require_directory(path)?;
        let files = self.listdir(dir.path(), ListFilter::FilesOnly).await?;
        match files.first() {
            Some(name) => self.get(dir.child(name)?.path()).await.map(Some),
            None => Ok(None),
        }
    }

    /// URL allowing a GET of an existing file
    pub async fn presigned_get_url(&self, path: &str, expires: Duration) -> Result<String> {
        let target = require_file(path)?;
        self.locate(&target).await?;
        self.presign(PresignMethod::Get, &target, expires).await
    }

    /// URL allowing a PUT of a file named `name` into directory `dir`
    pub async fn presigned_put_url(
        &self,
        dir: &str,
        name: &str,
        expires: Duration,
    ) -> Result<String> {
        let parent = require_directory(dir)?;
        if parent.is_root() {
            return Err(Error::InvalidRootOperation(
                "files cannot be stored in '/'".into(),
            ));
        }
        if name.contains('/') {
            return Err(Error::InvalidOperation(format!(
                "'{name}' is not a valid file name"
            )));
        }
        let target = parent.child(name)?;
        if !target.is_file() {
            return Err(Error::InvalidOperation(format!(
                "'{name}' is not a valid file name"
            )));
        }
        self.presign(PresignMethod::Put, &target, expires).await
    }

    /// URL allowing a DELETE of a file
    pub async fn presigned_delete_url(&self, path: &str, expires: Duration) -> Result<String> {
        let target = require_file(path)?;
        self.presign(PresignMethod::Delete, &target, expires).await
    }

    async fn presign(
        &self,
        method: PresignMethod,
        target: &PathMatch,
        expires: Duration,
    ) -> Result<String> {
        debug!(?method, path = %target, ?expires, "presigning");
        self.store
            .presign(method, target.bucket(), &target.relative_path(), expires)
            .await
    }
}

fn check_copy_source(src: &PathMatch, recursive: bool) -> Result<()> {
    if src.is_root() {
        return Err(Error::InvalidRootOperation(
            "cannot copy or move '/'".into(),
        ));
    }
    if src.is_dir() && !recursive {
        return Err(Error::InvalidOperation(
            "copying a directory must be done recursively".into(),
        ));
    }
    Ok(())
}

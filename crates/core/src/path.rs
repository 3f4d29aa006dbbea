//! Path parsing and resolution
//!
//! Paths are absolute, `/`-rooted strings addressing a bucket and a key:
//!
//! - `/` is the root and contains buckets
//! - `/bucket/` addresses a bucket
//! - `/bucket/prefix/.../` addresses a directory (always ends with `/`)
//! - `/bucket/prefix/.../name` addresses a file
//!
//! Repeated slashes are collapsed before parsing, so `/foo//bar/` and
//! `/foo/bar/` are the same path.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The root path
pub const ROOT: &str = "/";

/// A parsed absolute path, decomposed into bucket, prefix and filename
///
/// `prefix` is either empty or ends with `/`; `filename` is either empty
/// (the path is a directory) or the final slash-free segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathMatch {
    path: String,
    bucket: String,
    prefix: String,
    filename: String,
}

impl PathMatch {
    /// Parse and normalize an absolute path
    pub fn parse(path: &str) -> Result<Self> {
        let path = collapse_slashes(path);

        if path == ROOT {
            return Ok(Self {
                path,
                bucket: String::new(),
                prefix: String::new(),
                filename: String::new(),
            });
        }

        let Some(rest) = path.strip_prefix('/') else {
            return Err(Error::InvalidPath(format!(
                "'{path}' is not a valid path. Paths must be absolute"
            )));
        };

        // The bucket segment must be terminated by a slash, "/bucket" alone
        // is neither a bucket path nor a file path.
        let Some((bucket, key)) = rest.split_once('/') else {
            return Err(Error::InvalidPath(format!(
                "'{path}' is not a valid path. Use format: /bucket/[prefix/][name]"
            )));
        };

        let (prefix, filename) = match key.rfind('/') {
            Some(pos) => (&key[..=pos], &key[pos + 1..]),
            None => ("", key),
        };

        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            filename: filename.to_string(),
            path,
        })
    }

    /// The normalized path string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Bucket name (empty for root)
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Directory portion of the key, empty or slash-terminated
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Final segment of a file path, empty for directories
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Object key within the bucket (prefix + filename)
    pub fn relative_path(&self) -> String {
        format!("{}{}", self.prefix, self.filename)
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT
    }

    /// A bucket path has a bucket and nothing below it
    pub fn is_bucket(&self) -> bool {
        !self.bucket.is_empty() && self.prefix.is_empty() && self.filename.is_empty()
    }

    pub fn is_dir(&self) -> bool {
        self.filename.is_empty()
    }

    pub fn is_file(&self) -> bool {
        !self.is_dir()
    }

    /// Last segment of the directory part, without the trailing slash
    ///
    /// For `/foo/bar/baz` and `/foo/bar/` this is `bar`, for `/foo/` it is
    /// `foo`, for root it is empty.
    pub fn dir_name(&self) -> &str {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return &self.bucket;
        }
        match prefix.rfind('/') {
            Some(pos) => &prefix[pos + 1..],
            None => prefix,
        }
    }

    /// Prefix of the directory containing this entry
    ///
    /// `a/b/c` lives in `a/b/`, `a/b/` lives in `a/`, top-level entries live in `""`.
    pub fn parent_prefix(&self) -> &str {
        if self.is_file() {
            return &self.prefix;
        }
        let key = self.prefix.trim_end_matches('/');
        match key.rfind('/') {
            Some(pos) => &key[..=pos],
            None => "",
        }
    }

    /// Path of a file named `name` inside this directory
    pub fn child(&self, name: &str) -> Result<Self> {
        Self::parse(&format!("{}/{name}", self.path))
    }

    /// Path of a sub-directory named `name` inside this directory
    pub fn child_dir(&self, name: &str) -> Result<Self> {
        Self::parse(&format!("{}/{name}/", self.path))
    }

    /// Whether `other` is this directory or lies somewhere below it
    pub fn contains(&self, other: &PathMatch) -> bool {
        self.is_dir() && other.path.starts_with(&self.path)
    }

    /// Resolve where a file lands when copied or moved to `dst`
    ///
    /// A file destination is an explicit rename and is returned as is. A
    /// directory destination keeps the source's file name, like `cp a dir/`.
    pub fn infer_destination(src: &PathMatch, dst: &PathMatch) -> Result<PathMatch> {
        if !src.is_file() {
            return Err(Error::InvalidPath(format!(
                "'{src}' must be a path to a file"
            )));
        }

        if dst.is_file() {
            Ok(dst.clone())
        } else {
            dst.child(src.filename())
        }
    }
}

/// Parse `path` and reject anything that is not directory-shaped
///
/// Shared precondition of every directory operation.
pub fn require_directory(path: &str) -> Result<PathMatch> {
    let matched = PathMatch::parse(path)?;
    if matched.is_file() {
        return Err(Error::NotADirectoryPath(path.to_string()));
    }
    Ok(matched)
}

/// Parse `path` and reject anything that is not a file
pub fn require_file(path: &str) -> Result<PathMatch> {
    let matched = PathMatch::parse(path)?;
    if matched.is_dir() {
        return Err(Error::InvalidOperation(format!(
            "'{path}' is not a file path"
        )));
    }
    Ok(matched)
}

impl FromStr for PathMatch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PathMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut collapsed = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        collapsed.push(c);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_root() {
        let root = PathMatch::parse("/").unwrap();
        assert!(root.is_root());
        assert!(root.is_dir());
        assert!(!root.is_bucket());
        assert_eq!(root.bucket(), "");
        assert_eq!(root.relative_path(), "");
    }

    #[test]
    fn test_parse_collapses_slashes() {
        assert!(PathMatch::parse("///").unwrap().is_root());

        let dir = PathMatch::parse("//foo///bar//").unwrap();
        assert_eq!(dir.path(), "/foo/bar/");
        assert_eq!(dir.bucket(), "foo");
        assert_eq!(dir.prefix(), "bar/");
    }

    #[test]
    fn test_parse_bucket() {
        let bucket = PathMatch::parse("/foo/").unwrap();
        assert!(bucket.is_bucket());
        assert!(bucket.is_dir());
        assert!(!bucket.is_root());
        assert_eq!(bucket.bucket(), "foo");
        assert_eq!(bucket.prefix(), "");
        assert_eq!(bucket.filename(), "");
    }

    #[test]
    fn test_parse_directory() {
        let dir = PathMatch::parse("/foo/bar/baz/").unwrap();
        assert!(dir.is_dir());
        assert!(!dir.is_bucket());
        assert_eq!(dir.bucket(), "foo");
        assert_eq!(dir.prefix(), "bar/baz/");
        assert_eq!(dir.filename(), "");
        assert_eq!(dir.relative_path(), "bar/baz/");
    }

    #[test]
    fn test_parse_file() {
        let file = PathMatch::parse("/foo/bar/baz").unwrap();
        assert!(file.is_file());
        assert_eq!(file.bucket(), "foo");
        assert_eq!(file.prefix(), "bar/");
        assert_eq!(file.filename(), "baz");
        assert_eq!(file.relative_path(), "bar/baz");

        let top = PathMatch::parse("/foo/a").unwrap();
        assert!(top.is_file());
        assert_eq!(top.prefix(), "");
        assert_eq!(top.filename(), "a");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(PathMatch::parse(""), Err(Error::InvalidPath(_))));
        assert!(matches!(PathMatch::parse("foo/bar"), Err(Error::InvalidPath(_))));
        assert!(matches!(PathMatch::parse("/foo"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_dir_name() {
        assert_eq!(PathMatch::parse("/foo/").unwrap().dir_name(), "foo");
        assert_eq!(PathMatch::parse("/foo/bar/").unwrap().dir_name(), "bar");
        assert_eq!(PathMatch::parse("/foo/bar/baz/").unwrap().dir_name(), "baz");
        assert_eq!(PathMatch::parse("/foo/bar/file").unwrap().dir_name(), "bar");
        assert_eq!(PathMatch::parse("/").unwrap().dir_name(), "");
    }

    #[test]
    fn test_parent_prefix() {
        assert_eq!(PathMatch::parse("/foo/a/b/").unwrap().parent_prefix(), "a/");
        assert_eq!(PathMatch::parse("/foo/a/").unwrap().parent_prefix(), "");
        assert_eq!(PathMatch::parse("/foo/a/b/c").unwrap().parent_prefix(), "a/b/");
        assert_eq!(PathMatch::parse("/foo/c").unwrap().parent_prefix(), "");
    }

    #[test]
    fn test_child_paths() {
        let dir = PathMatch::parse("/foo/bar/").unwrap();
        assert_eq!(dir.child("baz").unwrap().path(), "/foo/bar/baz");
        assert_eq!(dir.child_dir("sub").unwrap().path(), "/foo/bar/sub/");
    }

    #[test]
    fn test_contains() {
        let dir = PathMatch::parse("/foo/bar/").unwrap();
        assert!(dir.contains(&PathMatch::parse("/foo/bar/").unwrap()));
        assert!(dir.contains(&PathMatch::parse("/foo/bar/baz/x").unwrap()));
        assert!(!dir.contains(&PathMatch::parse("/foo/barn/").unwrap()));
        assert!(!dir.contains(&PathMatch::parse("/foo/").unwrap()));
    }

    #[test]
    fn test_infer_destination_into_directory() {
        let src = PathMatch::parse("/foo/bar1/baz").unwrap();
        let dst = PathMatch::parse("/foo/bar2/").unwrap();
        let inferred = PathMatch::infer_destination(&src, &dst).unwrap();
        assert_eq!(inferred.path(), "/foo/bar2/baz");
    }

    #[test]
    fn test_infer_destination_rename() {
        let src = PathMatch::parse("/foo/bar1/baz").unwrap();
        let dst = PathMatch::parse("/foo/bar2/baz2").unwrap();
        let inferred = PathMatch::infer_destination(&src, &dst).unwrap();
        assert_eq!(inferred, dst);
    }

    #[test]
    fn test_infer_destination_requires_file_source() {
        let src = PathMatch::parse("/foo/bar1/").unwrap();
        let dst = PathMatch::parse("/foo/bar2/").unwrap();
        assert!(matches!(
            PathMatch::infer_destination(&src, &dst),
            Err(Error::InvalidPath(_))
        ));
    }

    #[test]
    fn test_require_directory() {
        assert!(require_directory("/").is_ok());
        assert!(require_directory("/foo/bar/").is_ok());
        assert!(matches!(
            require_directory("/foo/bar"),
            Err(Error::NotADirectoryPath(_))
        ));
        assert!(matches!(require_directory("/foo"), Err(Error::InvalidPath(_))));
    }

    #[test]
    fn test_require_file() {
        assert!(require_file("/foo/bar").is_ok());
        assert!(matches!(
            require_file("/foo/bar/"),
            Err(Error::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_from_str_and_display() {
        let parsed: PathMatch = "/foo//bar".parse().unwrap();
        assert_eq!(parsed.to_string(), "/foo/bar");
    }
}

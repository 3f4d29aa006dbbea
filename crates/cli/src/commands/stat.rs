//! stat command - show metadata of a bucket, directory or file

use std::collections::BTreeMap;

use clap::Args;
use serde::Serialize;

use bucketfs_core::object::normalize_metadata;
use bucketfs_core::{ObjectInfo, PathMatch, Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Show metadata of a path
#[derive(Args, Debug)]
pub struct StatArgs {
    /// Path to a bucket, directory or file
    pub path: String,
}

#[derive(Debug, Serialize)]
struct StatOutput {
    path: String,
    is_dir: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_human: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    metadata: BTreeMap<String, String>,
}

impl StatOutput {
    fn new(path: &PathMatch, info: ObjectInfo) -> Self {
        Self {
            path: path.to_string(),
            is_dir: info.is_dir,
            last_modified: info.last_modified.map(|ts| ts.to_string()),
            size_bytes: info.size_bytes,
            size_human: info.size_human,
            etag: info.etag,
            content_type: info.content_type,
            metadata: normalize_metadata(&info.metadata),
        }
    }

    fn render(&self) -> String {
        let mut lines = vec![format!("{:<10}: {}", "Name", self.path)];
        let kind = if self.is_dir { "directory" } else { "file" };
        lines.push(format!("{:<10}: {kind}", "Type"));
        if let Some(modified) = &self.last_modified {
            lines.push(format!("{:<10}: {modified}", "Date"));
        }
        if let (Some(bytes), Some(human)) = (self.size_bytes, &self.size_human) {
            lines.push(format!("{:<10}: {human} ({bytes} bytes)", "Size"));
        }
        if let Some(etag) = &self.etag {
            lines.push(format!("{:<10}: {etag}", "ETag"));
        }
        if let Some(content_type) = &self.content_type {
            lines.push(format!("{:<10}: {content_type}", "Content"));
        }
        if !self.metadata.is_empty() {
            lines.push(format!("{:<10}:", "Metadata"));
            for (key, value) in &self.metadata {
                lines.push(format!("  {key}: {value}"));
            }
        }
        lines.join("\n")
    }
}

pub async fn execute(fs: &VirtualFs, args: StatArgs, formatter: &Formatter) -> Result<ExitCode> {
    let path = PathMatch::parse(&args.path)?;
    let info = fs.info(path.path()).await?;

    let output = StatOutput::new(&path, info);
    formatter.emit(&output, || output.render());
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};
    use std::collections::HashMap;

    #[test]
    fn test_stat_output_normalizes_metadata() {
        let mut info = ObjectInfo::file("dir/file.txt", 1536);
        info.etag = Some("abc".into());
        info.metadata = HashMap::from([("X-Amz-Meta-Owner".to_string(), "ops".to_string())]);

        let path = PathMatch::parse("/b/dir/file.txt").unwrap();
        let output = StatOutput::new(&path, info);
        assert_eq!(output.metadata.get("owner").map(String::as_str), Some("ops"));

        let rendered = output.render();
        assert!(rendered.contains("/b/dir/file.txt"));
        assert!(rendered.contains("(1536 bytes)"));
        assert!(rendered.contains("owner: ops"));
    }

    #[tokio::test]
    async fn test_stat_bucket_and_root() {
        let fs = memory_fs();
        fs.mkdirs("/b/").await.unwrap();

        let args = StatArgs {
            path: "/b/".to_string(),
        };
        assert_eq!(execute(&fs, args, &quiet()).await.unwrap(), ExitCode::Success);

        let root = StatArgs {
            path: "/".to_string(),
        };
        let err = execute(&fs, root, &quiet()).await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }
}

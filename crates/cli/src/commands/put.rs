//! put command - upload a local file, or stdin with `-`
//!
//! A directory destination keeps the local file name. Stdin has no name, so
//! it needs a file destination.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use bucketfs_core::{Result, VirtualFs};

use super::parse_metadata;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, Spinner};

const STDIN: &str = "-";

/// Upload a local file or stdin
#[derive(Args, Debug)]
pub struct PutArgs {
    /// Local file, or '-' for stdin
    pub source: PathBuf,

    /// Destination file or directory path
    pub target: String,

    /// User metadata, repeatable
    #[arg(long = "meta", value_name = "KEY=VALUE")]
    pub metadata: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PutOutput {
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_bytes: Option<u64>,
}

pub async fn execute(fs: &VirtualFs, args: PutArgs, formatter: &Formatter) -> Result<ExitCode> {
    let metadata = parse_metadata(&args.metadata)?;
    let spinner = Spinner::new(formatter.config(), format!("Uploading to {}", args.target));

    let output = if args.source.as_os_str() == STDIN {
        let size = upload_reader(fs, tokio::io::stdin(), &args.target, metadata).await;
        spinner.finish();
        PutOutput {
            target: args.target,
            size_bytes: Some(size?),
        }
    } else {
        let written = fs.put_file(&args.source, &args.target, metadata).await;
        spinner.finish();
        PutOutput {
            target: written?.to_string(),
            size_bytes: None,
        }
    };

    formatter.emit(&output, || format!("Uploaded '{}'", output.target));
    Ok(ExitCode::Success)
}

/// Buffer `reader` and store it at `target`, returning the byte count
async fn upload_reader<R>(
    fs: &VirtualFs,
    mut reader: R,
    target: &str,
    metadata: HashMap<String, String>,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
{
    let mut data = Vec::new();
    let size = reader.read_to_end(&mut data).await? as u64;
    fs.put_data(target, data, metadata).await?;
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};
    use std::io::Write;

    #[tokio::test]
    async fn test_put_local_file_into_directory() {
        let fs = memory_fs();
        fs.mkdirs("/b/docs/").await.unwrap();

        let mut local = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        local.write_all(b"hello").unwrap();
        let name = local.path().file_name().unwrap().to_str().unwrap().to_string();

        let args = PutArgs {
            source: local.path().to_path_buf(),
            target: "/b/docs/".to_string(),
            metadata: vec!["owner=ops".to_string()],
        };
        execute(&fs, args, &quiet()).await.unwrap();

        let stored = fs.get(&format!("/b/docs/{name}")).await.unwrap();
        assert_eq!(stored.data(), Some(&b"hello"[..]));
        assert_eq!(stored.metadata.get("owner").map(String::as_str), Some("ops"));
    }

    #[tokio::test]
    async fn test_upload_reader_to_file_path() {
        let fs = memory_fs();
        fs.mkdirs("/b/").await.unwrap();

        let size = upload_reader(&fs, &b"streamed"[..], "/b/out.log", Default::default())
            .await
            .unwrap();
        assert_eq!(size, 8);
        let stored = fs.get("/b/out.log").await.unwrap();
        assert_eq!(stored.data(), Some(&b"streamed"[..]));
    }

    #[tokio::test]
    async fn test_upload_reader_needs_file_path() {
        let fs = memory_fs();
        let err = upload_reader(&fs, &b"x"[..], "/b/dir/", Default::default())
            .await
            .unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_put_rejects_bad_metadata() {
        let fs = memory_fs();
        let args = PutArgs {
            source: PathBuf::from("-"),
            target: "/b/f".to_string(),
            metadata: vec!["broken".to_string()],
        };
        let err = execute(&fs, args, &quiet()).await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }
}

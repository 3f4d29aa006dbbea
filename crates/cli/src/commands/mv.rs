//! mv command - move a file or a directory tree inside the store
//!
//! Implemented as copy then remove. The source is only removed once both
//! source and destination are visible.

use clap::Args;

use bucketfs_core::{Result, VirtualFs};

use super::cp::TransferOutput;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, Spinner};

/// Move a file or directory tree
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source path
    pub source: String,

    /// Destination path
    pub target: String,

    /// Move directories with their content
    #[arg(short, long)]
    pub recursive: bool,
}

pub async fn execute(fs: &VirtualFs, args: MvArgs, formatter: &Formatter) -> Result<ExitCode> {
    let spinner = Spinner::new(
        formatter.config(),
        format!("Moving {} to {}", args.source, args.target),
    );
    let dest = fs.mv(&args.source, &args.target, args.recursive).await;
    spinner.finish();
    let dest = dest?;

    let output = TransferOutput {
        source: args.source,
        target: dest.to_string(),
    };
    formatter.emit(&output, || format!("'{}' -> '{}'", output.source, output.target));
    Ok(ExitCode::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};

    #[tokio::test]
    async fn test_mv_bucket_to_new_bucket() {
        let fs = memory_fs();
        fs.put_data("/foo/bar/baz", b"x".to_vec(), Default::default())
            .await
            .unwrap();

        let args = MvArgs {
            source: "/foo/".to_string(),
            target: "/foo1/".to_string(),
            recursive: true,
        };
        execute(&fs, args, &quiet()).await.unwrap();

        assert!(!fs.exists("/foo/").await.unwrap());
        assert!(fs.exists("/foo1/bar/baz").await.unwrap());
    }

    #[tokio::test]
    async fn test_mv_rename_file() {
        let fs = memory_fs();
        fs.put_data("/b/old", b"x".to_vec(), Default::default()).await.unwrap();

        let args = MvArgs {
            source: "/b/old".to_string(),
            target: "/b/new".to_string(),
            recursive: false,
        };
        execute(&fs, args, &quiet()).await.unwrap();

        assert!(!fs.exists("/b/old").await.unwrap());
        assert!(fs.exists("/b/new").await.unwrap());
    }

    #[tokio::test]
    async fn test_mv_root_is_rejected() {
        let fs = memory_fs();
        let args = MvArgs {
            source: "/".to_string(),
            target: "/x/".to_string(),
            recursive: true,
        };
        let err = execute(&fs, args, &quiet()).await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }
}

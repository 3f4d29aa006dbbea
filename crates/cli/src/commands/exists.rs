//! exists command - check whether a path exists
//!
//! Prints `true` or `false`. A missing path exits with the not-found code
//! so scripts can branch on the status alone.

use clap::Args;
use serde::Serialize;

use bucketfs_core::{Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Check whether a path exists
#[derive(Args, Debug)]
pub struct ExistsArgs {
    /// Path to check
    pub path: String,
}

#[derive(Debug, Serialize)]
struct ExistsOutput {
    path: String,
    exists: bool,
    is_dir: bool,
}

pub async fn execute(fs: &VirtualFs, args: ExistsArgs, formatter: &Formatter) -> Result<ExitCode> {
    let exists = fs.exists(&args.path).await?;
    let is_dir = exists && fs.isdir(&args.path).await?;

    let output = ExistsOutput {
        path: args.path,
        exists,
        is_dir,
    };
    formatter.emit(&output, || output.exists.to_string());

    Ok(if exists {
        ExitCode::Success
    } else {
        ExitCode::NotFound
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};

    async fn check(fs: &VirtualFs, path: &str) -> ExitCode {
        let args = ExistsArgs {
            path: path.to_string(),
        };
        execute(fs, args, &quiet()).await.unwrap()
    }

    #[tokio::test]
    async fn test_exists_exit_codes() {
        let fs = memory_fs();
        fs.put_data("/b/dir/file", b"x".to_vec(), Default::default())
            .await
            .unwrap();

        assert_eq!(check(&fs, "/").await, ExitCode::Success);
        assert_eq!(check(&fs, "/b/").await, ExitCode::Success);
        assert_eq!(check(&fs, "/b/dir/").await, ExitCode::Success);
        assert_eq!(check(&fs, "/b/dir/file").await, ExitCode::Success);
        assert_eq!(check(&fs, "/b/dir/other").await, ExitCode::NotFound);
        assert_eq!(check(&fs, "/nope/").await, ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_malformed_path_does_not_exist() {
        let fs = memory_fs();
        assert_eq!(check(&fs, "relative/path").await, ExitCode::NotFound);
    }
}

//! rmdir command - remove directories
//!
//! Removing a bucket path removes the bucket. `rmdir -r /` empties the
//! whole store.

use clap::Args;

use bucketfs_core::{Result, VirtualFs};

use super::rm::RemovalOutput;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, Spinner};

/// Remove directories
#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Directory paths, each ending with '/'
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Remove the content as well
    #[arg(short, long)]
    pub recursive: bool,
}

pub async fn execute(fs: &VirtualFs, args: RmdirArgs, formatter: &Formatter) -> Result<ExitCode> {
    let mut output = RemovalOutput::default();
    let mut first_error = None;

    for path in &args.paths {
        let spinner = Spinner::new(formatter.config(), format!("Removing {path}"));
        let result = fs.rmdir(path, args.recursive).await;
        spinner.finish();

        match result {
            Ok(()) => {
                formatter.success(&format!("Removed '{path}'"));
                output.removed.push(path.clone());
            }
            Err(e) => {
                formatter.error(&e.to_string());
                first_error.get_or_insert(ExitCode::from_error(&e));
                output.failed.push(path.clone());
            }
        }
    }

    Ok(output.finish(formatter, first_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};

    #[tokio::test]
    async fn test_rmdir_bucket_recursive() {
        let fs = memory_fs();
        fs.mkdirs("/bucket/a/b/").await.unwrap();
        fs.put_data("/bucket/a/b/f", b"x".to_vec(), Default::default())
            .await
            .unwrap();

        let args = RmdirArgs {
            paths: vec!["/bucket/".to_string()],
            recursive: true,
        };
        assert_eq!(execute(&fs, args, &quiet()).await.unwrap(), ExitCode::Success);
        assert!(!fs.exists("/bucket/").await.unwrap());
    }

    #[tokio::test]
    async fn test_rmdir_rejects_file_path() {
        let fs = memory_fs();
        fs.put_data("/bucket/f", b"x".to_vec(), Default::default())
            .await
            .unwrap();

        let args = RmdirArgs {
            paths: vec!["/bucket/f".to_string()],
            recursive: false,
        };
        assert_eq!(execute(&fs, args, &quiet()).await.unwrap(), ExitCode::UsageError);
        assert!(fs.exists("/bucket/f").await.unwrap());
    }

    #[tokio::test]
    async fn test_rmdir_root_requires_recursive() {
        let fs = memory_fs();
        fs.mkdirs("/one/").await.unwrap();
        fs.mkdirs("/two/").await.unwrap();

        let keep = RmdirArgs {
            paths: vec!["/".to_string()],
            recursive: false,
        };
        assert_eq!(execute(&fs, keep, &quiet()).await.unwrap(), ExitCode::Conflict);

        let wipe = RmdirArgs {
            paths: vec!["/".to_string()],
            recursive: true,
        };
        assert_eq!(execute(&fs, wipe, &quiet()).await.unwrap(), ExitCode::Success);
        assert!(fs.listdir("/", Default::default()).await.unwrap().is_empty());
    }
}

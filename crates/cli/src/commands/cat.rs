//! cat command - print a file's content
//!
//! Bytes go to stdout unchanged, so binary files can be piped.

use clap::Args;
use std::io::{self, Write};

use bucketfs_core::{Error, Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Print a file's content
#[derive(Args, Debug)]
pub struct CatArgs {
    /// File path
    pub path: String,
}

pub async fn execute(fs: &VirtualFs, args: CatArgs, _formatter: &Formatter) -> Result<ExitCode> {
    let content = read(fs, &args.path).await?;

    let mut stdout = io::stdout().lock();
    stdout.write_all(&content)?;
    stdout.flush()?;
    Ok(ExitCode::Success)
}

async fn read(fs: &VirtualFs, path: &str) -> Result<Vec<u8>> {
    let object = fs.get(path).await?;
    match object.data() {
        Some(data) => Ok(data.to_vec()),
        None => Err(Error::InvalidOperation(format!("'{path}' is a directory"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::memory_fs;

    #[tokio::test]
    async fn test_read_file_content() {
        let fs = memory_fs();
        fs.put_data("/b/f.bin", vec![0, 159, 146, 150], Default::default())
            .await
            .unwrap();
        assert_eq!(read(&fs, "/b/f.bin").await.unwrap(), vec![0, 159, 146, 150]);
    }

    #[tokio::test]
    async fn test_read_directory_is_usage_error() {
        let fs = memory_fs();
        fs.mkdirs("/b/d/").await.unwrap();
        let err = read(&fs, "/b/d/").await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let fs = memory_fs();
        fs.mkdirs("/b/").await.unwrap();
        let err = read(&fs, "/b/none").await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }
}

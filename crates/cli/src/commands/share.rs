//! share command - presigned URLs
//!
//! `get` and `delete` take a file path. `put` takes the file path the URL
//! will allow uploading to; its directory must be below a bucket.

use std::time::Duration;

use clap::{Args, ValueEnum};
use jiff::SignedDuration;
use serde::Serialize;

use bucketfs_core::{ConfigManager, Error, PathMatch, Result, VirtualFs};

use crate::exit_code::ExitCode;
use crate::output::Formatter;

/// Longest lifetime S3 accepts for a presigned URL
const MAX_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShareMethod {
    Get,
    Put,
    Delete,
}

/// Generate a presigned URL
#[derive(Args, Debug)]
pub struct ShareArgs {
    /// File path
    pub path: String,

    /// HTTP method the URL is valid for
    #[arg(long, value_enum, default_value = "get")]
    pub method: ShareMethod,

    /// Lifetime, e.g. "1h", "30m" or "168h" (default from config)
    #[arg(long)]
    pub expires: Option<SignedDuration>,
}

#[derive(Debug, Serialize)]
struct ShareOutput {
    path: String,
    url: String,
    expires_secs: u64,
}

pub async fn execute(fs: &VirtualFs, args: ShareArgs, formatter: &Formatter) -> Result<ExitCode> {
    let expires = match args.expires {
        Some(expires) => expiry(expires)?,
        None => Duration::from_secs(ConfigManager::new()?.load()?.defaults.presign_expiry_secs),
    };

    let url = presign(fs, args.method, &args.path, expires).await?;
    let output = ShareOutput {
        path: args.path,
        url,
        expires_secs: expires.as_secs(),
    };
    formatter.emit(&output, || output.url.clone());
    Ok(ExitCode::Success)
}

async fn presign(
    fs: &VirtualFs,
    method: ShareMethod,
    path: &str,
    expires: Duration,
) -> Result<String> {
    match method {
        ShareMethod::Get => fs.presigned_get_url(path, expires).await,
        ShareMethod::Delete => fs.presigned_delete_url(path, expires).await,
        ShareMethod::Put => {
            let target = bucketfs_core::require_file(path)?;
            let dir = PathMatch::parse(&format!("/{}/{}", target.bucket(), target.prefix()))?;
            fs.presigned_put_url(dir.path(), target.filename(), expires).await
        }
    }
}

/// Check a requested lifetime against what presigning accepts
fn expiry(requested: SignedDuration) -> Result<Duration> {
    let expires = Duration::try_from(requested)
        .map_err(|_| Error::InvalidOperation("expiry must not be negative".into()))?;
    if expires.is_zero() || expires > MAX_EXPIRY {
        return Err(Error::InvalidOperation(format!(
            "expiry must be between 1s and 168h, got {requested:#}"
        )));
    }
    Ok(expires)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{memory_fs, quiet};

    #[test]
    fn test_expiry_bounds() {
        let hour: SignedDuration = "1h".parse().unwrap();
        assert_eq!(expiry(hour).unwrap(), Duration::from_secs(3600));

        let week: SignedDuration = "168h".parse().unwrap();
        assert_eq!(expiry(week).unwrap(), MAX_EXPIRY);

        let too_long: SignedDuration = "169h".parse().unwrap();
        assert!(expiry(too_long).is_err());
        assert!(expiry(SignedDuration::ZERO).is_err());
        assert!(expiry(SignedDuration::from_secs(-5)).is_err());
    }

    #[tokio::test]
    async fn test_memory_store_cannot_presign() {
        let fs = memory_fs();
        fs.put_data("/b/f", b"x".to_vec(), Default::default()).await.unwrap();

        let args = ShareArgs {
            path: "/b/f".to_string(),
            method: ShareMethod::Get,
            expires: Some(SignedDuration::from_hours(1)),
        };
        let err = execute(&fs, args, &quiet()).await.unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UnsupportedFeature);
    }

    #[tokio::test]
    async fn test_get_url_requires_existing_file() {
        let fs = memory_fs();
        fs.mkdirs("/b/").await.unwrap();
        let err = presign(&fs, ShareMethod::Get, "/b/none", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::NotFound);
    }

    #[tokio::test]
    async fn test_put_url_rejects_directory_path() {
        let fs = memory_fs();
        let err = presign(&fs, ShareMethod::Put, "/b/dir/", Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(ExitCode::from_error(&err), ExitCode::UsageError);
    }
}

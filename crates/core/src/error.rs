//! Error types for bucketfs-core
//!
//! One error type covers path validation, virtual directory semantics and
//! whatever the object store reports back. Each variant maps to a stable
//! process exit code.

use thiserror::Error;

/// Result type alias for bucketfs-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bucketfs-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed path string
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// A directory operation was given a file-shaped path
    #[error("'{0}' is not a valid directory path. must be absolute and end with /")]
    NotADirectoryPath(String),

    /// Operation that makes no sense on '/'
    #[error("Invalid operation on root: {0}")]
    InvalidRootOperation(String),

    /// Operation not allowed for this kind of path
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Non-recursive removal of a directory, bucket or root with content
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    /// Raised by object stores when a bucket still holds objects.
    /// The engine translates it into `DirectoryNotEmpty`.
    #[error("Bucket not empty: {0}")]
    BucketNotEmpty(String),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Alias not found
    #[error("Alias not found: {0}")]
    AliasNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network error (retryable)
    #[error("Network error: {0}")]
    Network(String),

    /// Conflict error
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Feature not supported by the object store
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidPath(_)
            | Error::NotADirectoryPath(_)
            | Error::InvalidRootOperation(_)
            | Error::InvalidOperation(_)
            | Error::Config(_) => 2, // UsageError
            Error::Network(_) => 3,  // NetworkError
            Error::Auth(_) => 4,     // AuthError
            Error::NotFound(_) | Error::AliasNotFound(_) => 5,
            Error::DirectoryNotEmpty(_) | Error::BucketNotEmpty(_) | Error::Conflict(_) => 6,
            Error::UnsupportedFeature(_) => 7,
            _ => 1, // GeneralError
        }
    }

    /// Whether the error means the addressed entry does not exist
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::InvalidPath("test".into()).exit_code(), 2);
        assert_eq!(Error::NotADirectoryPath("/a/b".into()).exit_code(), 2);
        assert_eq!(Error::InvalidRootOperation("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidOperation("test".into()).exit_code(), 2);
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::Network("test".into()).exit_code(), 3);
        assert_eq!(Error::Auth("test".into()).exit_code(), 4);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::AliasNotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::DirectoryNotEmpty("test".into()).exit_code(), 6);
        assert_eq!(Error::BucketNotEmpty("test".into()).exit_code(), 6);
        assert_eq!(Error::UnsupportedFeature("test".into()).exit_code(), 7);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_not_a_directory_message() {
        let err = Error::NotADirectoryPath("/foo/bar".into());
        let message = err.to_string();
        assert!(message.contains("/foo/bar"));
        assert!(message.contains("absolute"));
        assert!(message.contains("end with /"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::NotFound("x".into()).is_not_found());
        assert!(!Error::InvalidPath("x".into()).is_not_found());
    }
}

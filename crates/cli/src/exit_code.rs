//! Exit status of the bfs binary
//!
//! Every failure maps to one of a handful of codes so scripts can tell a
//! missing path (5) from a non-empty directory (6) without parsing stderr.

use bucketfs_core::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,

    /// Anything not covered below, including local I/O failures
    GeneralError = 1,

    /// Malformed path, file path where a directory is expected, an
    /// operation on `/` or a bad flag value
    UsageError = 2,

    /// The store could not be reached or answered with a 5xx
    NetworkError = 3,

    AuthError = 4,

    /// Missing bucket, directory, file or alias
    NotFound = 5,

    /// Directory or bucket not empty, bucket already exists
    Conflict = 6,

    /// The store cannot do this, e.g. presigning against memory
    UnsupportedFeature = 7,

    /// Ctrl-C arrived before the command finished
    Interrupted = 130,
}

impl ExitCode {
    /// Code for a failed operation
    pub const fn from_error(err: &Error) -> Self {
        match err.exit_code() {
            2 => Self::UsageError,
            3 => Self::NetworkError,
            4 => Self::AuthError,
            5 => Self::NotFound,
            6 => Self::Conflict,
            7 => Self::UnsupportedFeature,
            _ => Self::GeneralError,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

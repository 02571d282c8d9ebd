//! Error types for download execution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for download results.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors produced while fetching files to disk.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure or non-success HTTP status.
    #[error("download request failed")]
    Http {
        /// Operation that issued the request.
        operation: &'static str,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// Local filesystem failure while writing content.
    #[error("download io failure")]
    Io {
        /// Operation that touched the filesystem.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) const fn http(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Http { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

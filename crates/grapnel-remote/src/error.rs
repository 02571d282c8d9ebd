//! Error types for remote service operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for remote service results.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors produced while talking to the hosting service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure before a body could be read.
    #[error("remote request failed")]
    Http {
        /// Operation that issued the request.
        operation: &'static str,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// The service answered with an error status.
    #[error("remote service rejected the request")]
    Api {
        /// Operation that issued the request.
        operation: &'static str,
        /// Message reported by the service.
        message: String,
    },
    /// Response body did not decode into the expected shape.
    #[error("remote response could not be decoded")]
    Decode {
        /// Operation that issued the request.
        operation: &'static str,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// Local file access failed while preparing an upload.
    #[error("upload io failure")]
    Io {
        /// Operation that touched the filesystem.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// More than one transfer name starts with the given prefix.
    #[error("transfer name prefix is ambiguous")]
    AmbiguousName {
        /// Prefix supplied by the caller.
        prefix: String,
    },
    /// No transfer name starts with the given prefix.
    #[error("no transfer matched the name prefix")]
    NoMatch {
        /// Prefix supplied by the caller.
        prefix: String,
    },
}

impl RemoteError {
    pub(crate) const fn http(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Http { operation, source }
    }

    pub(crate) const fn api(operation: &'static str, message: String) -> Self {
        Self::Api { operation, message }
    }

    pub(crate) const fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

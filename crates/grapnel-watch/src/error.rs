//! Error types for watch and ledger operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for watch results.
pub type WatchResult<T> = Result<T, WatchError>;

/// Primary error type for watch and ledger operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// File system operation failed.
    #[error("filesystem operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// Underlying database operation failed.
    #[error("ledger database operation failed")]
    Database {
        /// Operation identifier.
        operation: &'static str,
        /// Source database error.
        source: sqlx::Error,
    },
    /// The file match pattern did not compile.
    #[error("invalid file match pattern")]
    Pattern {
        /// Pattern supplied by the caller.
        pattern: String,
        /// Source pattern error.
        source: regex::Error,
    },
    /// The watched path is not a directory.
    #[error("not a directory")]
    NotADirectory {
        /// Path supplied by the caller.
        path: PathBuf,
    },
}

impl WatchError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) const fn database(operation: &'static str, source: sqlx::Error) -> Self {
        Self::Database { operation, source }
    }

    pub(crate) fn pattern(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }

    pub(crate) fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory { path: path.into() }
    }
}

#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Directory watching and its two reconciliation loops.
//!
//! [`DirectoryScanner`] turns a directory tree into a stream of matching
//! file paths. The upload loop feeds those paths to the remote service
//! and records the resulting transfer ids in the [`UploadLedger`]; the
//! download loop polls the service for finished transfers and mirrors
//! them to local disk. Both loops run against a [`WatchContext`] that
//! bundles the remote client with the ledger.

pub mod context;
pub mod download;
pub mod error;
pub mod ledger;
pub mod scanner;
pub mod upload;

pub use context::WatchContext;
pub use download::{DownloadLoopConfig, spawn_download_loop};
pub use error::{WatchError, WatchResult};
pub use ledger::{DEFAULT_LEDGER_FILE, LedgerHandle, UploadLedger};
pub use scanner::DirectoryScanner;
pub use upload::{UploadLoopConfig, spawn_upload_loop};

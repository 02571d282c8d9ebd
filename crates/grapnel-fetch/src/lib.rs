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

//! Download planning and execution for transfer content trees.
//!
//! [`plan_downloads`] flattens a browsed content tree into
//! [`DownloadTask`]s sorted by destination, applying the video
//! extension and name blacklist filter; [`Downloader`] streams each
//! task to disk under an optional byte budget.

pub mod download;
pub mod error;
pub mod filter;
pub mod plan;

pub use download::Downloader;
pub use error::{FetchError, FetchResult};
pub use plan::{DownloadTask, PlanOptions, plan_downloads};

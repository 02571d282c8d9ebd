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

//! Wire models and REST client for the torrent-hosting service.
//!
//! The service speaks form-encoded POST requests authenticated by a
//! customer id and PIN, answering JSON envelopes whose `status` field
//! carries `"error"` plus a message on failure. [`RemoteClient`] wraps
//! the endpoints the rest of the workspace needs: listing transfers,
//! browsing a transfer's content tree, creating transfers from torrent
//! files or magnet links, and deleting transfers.

pub mod client;
pub mod error;
pub mod model;

pub use client::RemoteClient;
pub use error::{RemoteError, RemoteResult};
pub use model::{
    Ack, ContentNode, DirNode, FileNode, Transfer, TransferList, TransferStatus, TransferTree,
    UploadTicket,
};

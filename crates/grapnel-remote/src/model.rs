//! Wire DTOs for the hosting service's JSON API.
//!
//! The shapes mirror the service's responses so tests can pin exact
//! payloads; every envelope carries a `status` field that the client
//! inspects before handing the payload to callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lifecycle states the service reports for a transfer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Accepted but not yet scheduled server-side.
    Waiting,
    /// Scheduled and waiting for a fetch slot.
    Queued,
    /// Actively fetching content server-side.
    Running,
    /// Content is complete and browsable.
    Finished,
    /// Complete and seeding back to the swarm.
    Seeding,
    /// The server-side fetch failed.
    Error,
    /// Any status string this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl TransferStatus {
    /// Whether the transfer's content is complete and browsable.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Stable lowercase label used when rendering the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Seeding => "seeding",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

/// One entry in the service's transfer list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transfer {
    /// Stable identifier used for delete calls and ledger entries.
    pub id: String,
    /// Info hash used to browse the transfer's content.
    #[serde(default)]
    pub hash: String,
    /// Display name of the transfer.
    pub name: String,
    /// Current lifecycle status.
    pub status: TransferStatus,
    /// Total payload size in bytes.
    #[serde(default)]
    pub size: u64,
    /// Completion fraction between 0.0 and 1.0.
    #[serde(default)]
    pub progress: f64,
}

/// Envelope returned by the transfer list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferList {
    /// Service-level status, `"error"` on failure.
    pub status: String,
    /// Human-readable detail accompanying an error status.
    #[serde(default)]
    pub message: Option<String>,
    /// Transfers currently known to the account, in service order.
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

/// One node in a transfer's content tree, discriminated by the wire
/// `type` field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentNode {
    /// A downloadable file.
    File(FileNode),
    /// A directory of further nodes.
    Dir(DirNode),
}

/// A downloadable file inside a transfer's content tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileNode {
    /// Display name of the file.
    pub name: String,
    /// Path relative to the transfer root, `/`-separated.
    #[serde(default)]
    pub path: String,
    /// Direct download URL for the file's bytes.
    #[serde(default)]
    pub url: String,
    /// File extension as reported by the service, without the dot.
    #[serde(default)]
    pub ext: String,
    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
}

/// A directory node holding children keyed by display name.
///
/// The map keeps children in name order so rendering and planning walk
/// the tree deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DirNode {
    /// Child nodes keyed by display name.
    #[serde(default)]
    pub children: BTreeMap<String, ContentNode>,
}

/// Envelope returned by the content browse endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferTree {
    /// Service-level status, `"error"` on failure.
    pub status: String,
    /// Human-readable detail accompanying an error status.
    #[serde(default)]
    pub message: Option<String>,
    /// Total size in bytes of the transfer's content.
    #[serde(default)]
    pub size: u64,
    /// Root nodes keyed by display name.
    #[serde(default)]
    pub content: BTreeMap<String, ContentNode>,
}

/// Envelope returned when a transfer is created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadTicket {
    /// Service-level status, `"error"` on failure.
    pub status: String,
    /// Human-readable detail accompanying an error status.
    #[serde(default)]
    pub message: Option<String>,
    /// Identifier assigned to the created transfer.
    #[serde(default)]
    pub id: String,
    /// Name the service derived for the transfer.
    #[serde(default)]
    pub name: String,
}

/// Minimal acknowledgement envelope returned by mutating endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    /// Service-level status, `"error"` on failure.
    pub status: String,
    /// Human-readable detail accompanying an error status.
    #[serde(default)]
    pub message: Option<String>,
}

//! Command-line client for a remote torrent hosting service.
//!
//! Layout:
//! - `cli`: argument surface, error classification, and the `run`
//!   entrypoint wired up by the `grapnel` binary.
//! - `config`: YAML settings with environment overrides.
//! - `commands`: one handler per subcommand, grouped by concern.
//! - `output`: stdout rendering for the list and tree views.
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
#![allow(clippy::redundant_pub_crate)]

pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod config;
pub(crate) mod output;

pub use cli::run;

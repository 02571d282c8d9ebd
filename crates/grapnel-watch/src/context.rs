//! Collaborators shared by the two reconciliation loops.

use grapnel_remote::RemoteClient;

use crate::ledger::LedgerHandle;

/// Explicit bundle of the collaborators both loops work against. The
/// loops never share any other state.
#[derive(Debug, Clone)]
pub struct WatchContext {
    /// Credentialed client for the hosting service.
    pub remote: RemoteClient,
    /// Lazily-opened upload ledger.
    pub ledger: LedgerHandle,
}

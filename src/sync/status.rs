use serde::Serialize;
use std::fmt;

/// Sync state surfaced to the display layer.
///
/// Nothing in the sync pipeline is fatal: every failure resolves to one of
/// these values, and the user can keep editing locally under any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Startup, before the first poll resolves.
    Loading,
    /// A write is in flight or scheduled for retry.
    Syncing,
    /// In-memory state matches the last remote exchange.
    Synced,
    /// The last poll failed; running on local state.
    Offline,
    /// Automatic write retries are exhausted; waiting on a manual retry.
    Error,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncStatus::Loading => "loading",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Synced => "synced",
            SyncStatus::Offline => "offline",
            SyncStatus::Error => "error",
        };
        write!(f, "{}", name)
    }
}

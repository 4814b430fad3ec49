//! Client-side synchronization for the shared board document.
//!
//! The shared document lives in a hosted JSON blob store with no conflict
//! detection, so replication is polling-based and last-writer-wins:
//!
//! 1. At startup the local mirror seeds in-memory state instantly
//! 2. A fixed-period poll fetches the remote blob, sanitizes it, and
//!    adopts it when it differs from the in-memory document
//! 3. Local edits apply optimistically, land in the mirror synchronously,
//!    and schedule one debounced remote write per burst
//! 4. Failed writes retry with backoff up to a cap, then wait for a
//!    manual retry; failed reads just flag the board as offline
//!
//! Polls are suppressed whenever an accepted local edit has not reached
//! the store yet, so a stale read can never clobber an outstanding write.

mod engine;
mod status;

pub use engine::{Command, SyncEngine, SyncHandle, SyncOptions};
pub use status::SyncStatus;

//! Worshipboard Core Library
//!
//! Shared document model and sync engine for a collaborative worship
//! set-list board: named ministers each own an ordered song list, plus a
//! shared rehearsal notice and a gallery of schedule images. Editors work
//! on a draft schema and explicitly publish it; every change is logged.
//!
//! The board is multi-device: one shared JSON document in a hosted blob
//! store, reconciled by the [`sync`] engine with optimistic local edits,
//! a durable local mirror, debounced writes, and polling reads.

pub mod config;
pub mod mirror;
pub mod models;
pub mod remote;
pub mod sync;

pub use config::{Config, ConfigError, ConfigSource, ConfigValue, SyncConfig};
pub use mirror::{LocalMirror, MirrorError};
pub use models::{
    AuditEntry, Document, Edit, ImageError, Minister, MusicKey, Schema, ScheduleImage, Song,
    SongPatch,
};
pub use remote::{FetchError, HttpRemote, NotConfigured, PushError, RemoteStore};
pub use sync::{SyncEngine, SyncHandle, SyncOptions, SyncStatus};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Shared data model for the worship board document.

mod audit;
mod document;
mod edit;
mod image;
mod minister;
mod schema;
mod song;

pub use audit::{AuditEntry, MAX_LOG_ENTRIES};
pub use document::Document;
pub use edit::Edit;
pub use image::{ImageError, ScheduleImage, MAX_IMAGE_BYTES};
pub use minister::Minister;
pub use schema::{Schema, DEFAULT_REHEARSAL_INFO, SEED_ROSTER};
pub use song::{MusicKey, Song, SongPatch};

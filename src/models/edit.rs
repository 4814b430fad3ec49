//! User intents against the draft schema.

use super::image::ScheduleImage;
use super::minister::Minister;
use super::schema::Schema;
use super::song::{Song, SongPatch};

/// A single editing intent.
///
/// Applying an edit is pure: the input schema is never mutated, and a
/// rejected intent yields `None` so the caller can treat it as a complete
/// no-op: no audit entry, no mirror write, no network. Rejection happens
/// when a required text field is empty after trimming, or when the target
/// id does not exist.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddMinister {
        name: String,
    },
    RemoveMinister {
        minister_id: String,
    },
    AddSong {
        minister_id: String,
        title: String,
        artist: String,
    },
    UpdateSong {
        minister_id: String,
        song_id: String,
        patch: SongPatch,
    },
    RemoveSong {
        minister_id: String,
        song_id: String,
    },
    SetRehearsalInfo {
        text: String,
    },
    AddScheduleImage {
        image: ScheduleImage,
    },
    RemoveScheduleImage {
        image_id: String,
    },
}

impl Edit {
    /// Applies this edit to a schema, returning the new schema or `None`
    /// when the intent is rejected.
    pub fn apply(&self, schema: &Schema) -> Option<Schema> {
        match self {
            Edit::AddMinister { name } => {
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let mut next = schema.clone();
                next.ministers.push(Minister::new(name));
                Some(next)
            }
            Edit::RemoveMinister { minister_id } => {
                schema.minister(minister_id)?;
                let mut next = schema.clone();
                next.ministers.retain(|m| m.id != *minister_id);
                Some(next)
            }
            Edit::AddSong {
                minister_id,
                title,
                artist,
            } => {
                let title = title.trim();
                let artist = artist.trim();
                if title.is_empty() || artist.is_empty() {
                    return None;
                }
                map_minister(schema, minister_id, |m| m.songs.push(Song::new(title, artist)))
            }
            Edit::UpdateSong {
                minister_id,
                song_id,
                patch,
            } => {
                if patch.clears_required_field() {
                    return None;
                }
                let song_index = schema
                    .minister(minister_id)?
                    .songs
                    .iter()
                    .position(|s| s.id == *song_id)?;
                map_minister(schema, minister_id, |m| {
                    let patched = m.songs[song_index].patched(patch);
                    m.songs[song_index] = patched;
                })
            }
            Edit::RemoveSong {
                minister_id,
                song_id,
            } => {
                schema.minister(minister_id)?.song(song_id)?;
                map_minister(schema, minister_id, |m| {
                    m.songs.retain(|s| s.id != *song_id);
                })
            }
            Edit::SetRehearsalInfo { text } => {
                // Free text, unvalidated; replaced as a whole.
                let mut next = schema.clone();
                next.rehearsal_info = text.clone();
                Some(next)
            }
            Edit::AddScheduleImage { image } => {
                let mut next = schema.clone();
                next.scale_images.insert(0, image.clone());
                Some(next)
            }
            Edit::RemoveScheduleImage { image_id } => {
                if !schema.scale_images.iter().any(|i| i.id == *image_id) {
                    return None;
                }
                let mut next = schema.clone();
                next.scale_images.retain(|i| i.id != *image_id);
                Some(next)
            }
        }
    }

    /// Audit-log line for this edit, resolved against the pre-edit schema.
    pub fn describe(&self, schema: &Schema) -> String {
        match self {
            Edit::AddMinister { name } => format!("added minister {}", name.trim()),
            Edit::RemoveMinister { minister_id } => match schema.minister(minister_id) {
                Some(m) => format!("removed minister {}", m.name),
                None => "removed a minister".to_string(),
            },
            Edit::AddSong {
                minister_id, title, ..
            } => {
                let owner = schema
                    .minister(minister_id)
                    .map(|m| m.name.as_str())
                    .unwrap_or("?");
                format!("added song {} for {}", title.trim(), owner)
            }
            Edit::UpdateSong {
                minister_id,
                song_id,
                ..
            } => format!("edited song {}", song_title(schema, minister_id, song_id)),
            Edit::RemoveSong {
                minister_id,
                song_id,
            } => format!("removed song {}", song_title(schema, minister_id, song_id)),
            Edit::SetRehearsalInfo { .. } => "updated the rehearsal notice".to_string(),
            Edit::AddScheduleImage { .. } => "shared a schedule image".to_string(),
            Edit::RemoveScheduleImage { .. } => "removed a schedule image".to_string(),
        }
    }
}

fn map_minister(
    schema: &Schema,
    minister_id: &str,
    change: impl FnOnce(&mut Minister),
) -> Option<Schema> {
    let index = schema.ministers.iter().position(|m| m.id == minister_id)?;
    let mut next = schema.clone();
    change(&mut next.ministers[index]);
    Some(next)
}

fn song_title<'a>(schema: &'a Schema, minister_id: &str, song_id: &str) -> &'a str {
    schema
        .minister(minister_id)
        .and_then(|m| m.song(song_id))
        .map(|s| s.title.as_str())
        .unwrap_or("a song")
}

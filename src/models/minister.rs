use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::song::Song;

/// A named owner of an ordered song list.
///
/// Song order is insertion order and display-significant: new songs are
/// appended, and nothing reorders them short of deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minister {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl Minister {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            songs: Vec::new(),
        }
    }

    /// Used for the fixed seed roster, which carries stable ids.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            songs: Vec::new(),
        }
    }

    pub fn song(&self, song_id: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == song_id)
    }
}

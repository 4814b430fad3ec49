use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Transposed key a minister sings a song in.
///
/// `Original` means "as recorded" and is what every new song starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MusicKey {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
    #[default]
    Original,
}

impl MusicKey {
    pub const ALL: [MusicKey; 8] = [
        MusicKey::C,
        MusicKey::D,
        MusicKey::E,
        MusicKey::F,
        MusicKey::G,
        MusicKey::A,
        MusicKey::B,
        MusicKey::Original,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MusicKey::C => "C",
            MusicKey::D => "D",
            MusicKey::E => "E",
            MusicKey::F => "F",
            MusicKey::G => "G",
            MusicKey::A => "A",
            MusicKey::B => "B",
            MusicKey::Original => "ORIGINAL",
        }
    }

    /// Lenient parser for keys read from untrusted blobs.
    ///
    /// Older clients stored display labels like "C (DO)"; only the leading
    /// token matters. Anything unrecognized falls back to `Original`.
    pub fn from_token(token: &str) -> Self {
        let head = token
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match head.as_str() {
            "C" => MusicKey::C,
            "D" => MusicKey::D,
            "E" => MusicKey::E,
            "F" => MusicKey::F,
            "G" => MusicKey::G,
            "A" => MusicKey::A,
            "B" => MusicKey::B,
            _ => MusicKey::Original,
        }
    }
}

impl fmt::Display for MusicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A song in a minister's set list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    #[serde(default)]
    pub key: MusicKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_link: Option<String>,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            artist: artist.into(),
            key: MusicKey::default(),
            youtube_link: None,
        }
    }

    pub fn with_key(mut self, key: MusicKey) -> Self {
        self.key = key;
        self
    }

    pub fn with_youtube_link(mut self, link: impl Into<String>) -> Self {
        self.youtube_link = Some(link.into());
        self
    }

    /// Returns a copy with the patch merged in. Empty link text clears the
    /// link; validation of required fields happens at the intent boundary.
    pub fn patched(&self, patch: &SongPatch) -> Song {
        let mut next = self.clone();
        if let Some(title) = &patch.title {
            next.title = title.trim().to_string();
        }
        if let Some(artist) = &patch.artist {
            next.artist = artist.trim().to_string();
        }
        if let Some(key) = patch.key {
            next.key = key;
        }
        if let Some(link) = &patch.youtube_link {
            next.youtube_link = if link.trim().is_empty() {
                None
            } else {
                Some(link.clone())
            };
        }
        next
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {} [{}]", self.title, self.artist, self.key)
    }
}

/// Partial update for a song; unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SongPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub key: Option<MusicKey>,
    pub youtube_link: Option<String>,
}

impl SongPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_key(mut self, key: MusicKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn with_youtube_link(mut self, link: impl Into<String>) -> Self {
        self.youtube_link = Some(link.into());
        self
    }

    /// True when the patch would blank out a required text field.
    pub fn clears_required_field(&self) -> bool {
        let blank = |field: &Option<String>| {
            field.as_deref().is_some_and(|text| text.trim().is_empty())
        };
        blank(&self.title) || blank(&self.artist)
    }
}

//! The full shared record: a draft schema editors work on, the published
//! schema viewers see, and a bounded audit log.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::audit::{AuditEntry, MAX_LOG_ENTRIES};
use super::image::ScheduleImage;
use super::minister::Minister;
use super::schema::Schema;
use super::song::{MusicKey, Song};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub published: Schema,
    #[serde(default)]
    pub draft: Schema,
    #[serde(default)]
    pub logs: Vec<AuditEntry>,
}

impl Document {
    /// Startup document used when the local mirror is empty.
    pub fn seed() -> Self {
        let schema = Schema::seeded();
        Self {
            published: schema.clone(),
            draft: schema,
            logs: Vec::new(),
        }
    }

    /// Prepends an audit entry, keeping the log bounded.
    pub fn record(&mut self, user: &str, action: impl Into<String>) {
        self.logs.insert(0, AuditEntry::new(user, action));
        self.logs.truncate(MAX_LOG_ENTRIES);
    }

    /// Deep-copies the draft over the published snapshot and records who
    /// did it. The returned document shares no containers between tiers,
    /// so later draft edits cannot reach into the published copy.
    pub fn promote(&self, user: &str) -> Document {
        let mut next = self.clone();
        next.published = next.draft.clone();
        next.record(user, "published the draft");
        next
    }

    /// Normalizes an untrusted blob into a well-formed document.
    ///
    /// Never fails: missing or mistyped fields become defaults, entries
    /// without a usable id are dropped, and flat blobs written by early
    /// clients (one schema at the top level, no draft/published split)
    /// are lifted into both tiers.
    pub fn sanitize(value: &Value) -> Document {
        let has_split = value
            .as_object()
            .is_some_and(|map| map.contains_key("draft") || map.contains_key("published"));

        let (published, draft) = if has_split {
            (
                sanitize_schema(value.get("published").unwrap_or(&Value::Null)),
                sanitize_schema(value.get("draft").unwrap_or(&Value::Null)),
            )
        } else {
            let schema = sanitize_schema(value);
            (schema.clone(), schema)
        };

        let logs = value
            .get("logs")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(sanitize_log_entry)
                    .take(MAX_LOG_ENTRIES)
                    .collect()
            })
            .unwrap_or_default();

        Document {
            published,
            draft,
            logs,
        }
    }
}

fn sanitize_schema(value: &Value) -> Schema {
    Schema {
        ministers: array_field(value, "ministers", sanitize_minister),
        scale_images: array_field(value, "scaleImages", sanitize_image),
        rehearsal_info: string_field(value, "rehearsalInfo"),
    }
}

fn sanitize_minister(value: &Value) -> Option<Minister> {
    Some(Minister {
        id: required_id(value)?,
        name: string_field(value, "name"),
        songs: array_field(value, "songs", sanitize_song),
    })
}

fn sanitize_song(value: &Value) -> Option<Song> {
    let youtube_link = value
        .get("youtubeLink")
        .and_then(Value::as_str)
        .filter(|link| !link.trim().is_empty())
        .map(str::to_string);

    Some(Song {
        id: required_id(value)?,
        title: string_field(value, "title"),
        artist: string_field(value, "artist"),
        key: value
            .get("key")
            .and_then(Value::as_str)
            .map(MusicKey::from_token)
            .unwrap_or_default(),
        youtube_link,
    })
}

fn sanitize_image(value: &Value) -> Option<ScheduleImage> {
    Some(ScheduleImage {
        id: required_id(value)?,
        url: string_field(value, "url"),
        date: string_field(value, "date"),
    })
}

fn sanitize_log_entry(value: &Value) -> Option<AuditEntry> {
    Some(AuditEntry {
        id: required_id(value)?,
        user: string_field(value, "user"),
        action: string_field(value, "action"),
        timestamp: string_field(value, "timestamp"),
    })
}

/// Entries without a usable id cannot be addressed by later edits and are
/// dropped. Generating one here would make sanitize non-idempotent.
fn required_id(value: &Value) -> Option<String> {
    value
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn array_field<T>(value: &Value, key: &str, each: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|item| each(item)).collect())
        .unwrap_or_default()
}

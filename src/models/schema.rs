use serde::{Deserialize, Serialize};

use super::image::ScheduleImage;
use super::minister::Minister;

/// Fixed roster the board starts with when no local state exists.
pub const SEED_ROSTER: [(&str, &str); 6] = [
    ("minister-neto", "Neto"),
    ("minister-mayke", "Mayke"),
    ("minister-alisson", "Alisson"),
    ("minister-lilian", "Lilian"),
    ("minister-andressa", "Andressa"),
    ("minister-carlao", "Carlão"),
];

pub const DEFAULT_REHEARSAL_INFO: &str =
    "Rehearsals every Wednesday at 19:30 and Sunday at 17:30.";

/// One complete snapshot of editable content: ministers with their set
/// lists, the schedule image gallery, and the shared rehearsal notice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(default)]
    pub ministers: Vec<Minister>,
    #[serde(default)]
    pub scale_images: Vec<ScheduleImage>,
    #[serde(default)]
    pub rehearsal_info: String,
}

impl Schema {
    pub fn seeded() -> Self {
        Self {
            ministers: SEED_ROSTER
                .iter()
                .map(|(id, name)| Minister::with_id(*id, *name))
                .collect(),
            scale_images: Vec::new(),
            rehearsal_info: DEFAULT_REHEARSAL_INFO.to_string(),
        }
    }

    pub fn minister(&self, minister_id: &str) -> Option<&Minister> {
        self.ministers.iter().find(|m| m.id == minister_id)
    }
}

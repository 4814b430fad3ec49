use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Most recent audit entries retained; older ones are dropped.
pub const MAX_LOG_ENTRIES: usize = 40;

/// One line of the shared audit log: who did what, when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: String,
    pub user: String,
    pub action: String,
    /// Display timestamp stamped at creation.
    pub timestamp: String,
}

impl AuditEntry {
    pub fn new(user: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user: user.into(),
            action: action.into(),
            timestamp: Local::now().format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

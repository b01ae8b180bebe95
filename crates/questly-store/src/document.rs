//! The persisted document.

use questly_progression::{ChatMessage, TaskBoard, UserProfile, WeeklyHistory};
use serde::{Deserialize, Serialize};

/// Everything Questly persists.
///
/// Missing sections deserialize to their empty defaults, so documents
/// written before a section existed still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuestlyDocument {
    /// Quest board, newest first.
    pub tasks: TaskBoard,
    /// Player profile.
    pub user: UserProfile,
    /// Weekly completion buckets.
    pub history: WeeklyHistory,
    /// Mentor conversation.
    pub chat_history: Vec<ChatMessage>,
    /// Timetable entries, stored as written by the client.
    pub timetable: Vec<serde_json::Value>,
}

impl QuestlyDocument {
    /// Repair a freshly read document.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.history = self.history.normalized();
        self
    }
}

//! Quests, sub-steps and the quest board.

use chrono::{DateTime, Duration, Utc};
use questly_common::{SubTaskId, TaskId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quest category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskCategory {
    /// Learning.
    #[default]
    Study,
    /// Exercise, sleep, food.
    Health,
    /// Programming.
    Coding,
    /// Art, writing, music.
    Creative,
    /// Anything else.
    Other,
}

impl TaskCategory {
    /// All categories.
    pub const ALL: [Self; 5] = [
        Self::Study,
        Self::Health,
        Self::Coding,
        Self::Creative,
        Self::Other,
    ];

    /// Parses a category name, falling back to Study like suggestion payloads do.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "health" => Self::Health,
            "coding" => Self::Coding,
            "creative" => Self::Creative,
            "other" => Self::Other,
            _ => Self::Study,
        }
    }
}

/// Quest difficulty; fixes the quest's XP value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// 50 XP.
    #[default]
    Easy,
    /// 150 XP.
    Hard,
    /// 300 XP.
    #[serde(rename = "Extremely Hard")]
    ExtremelyHard,
}

impl Difficulty {
    /// XP granted for completing a quest of this difficulty.
    #[must_use]
    pub const fn xp_value(self) -> u64 {
        match self {
            Self::Easy => 50,
            Self::Hard => 150,
            Self::ExtremelyHard => 300,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Hard => "Hard",
            Self::ExtremelyHard => "Extremely Hard",
        }
    }
}

/// Minor step inside a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    /// Id, unique within the quest.
    pub id: SubTaskId,
    /// Title.
    pub title: String,
    /// Done flag.
    pub is_completed: bool,
}

impl SubTask {
    /// Create an open sub-step with a fresh id.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: SubTaskId::generate(),
            title: title.into(),
            is_completed: false,
        }
    }
}

/// A quest on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Id.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Optional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category.
    #[serde(default)]
    pub category: TaskCategory,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Done flag.
    pub is_completed: bool,
    /// Due date.
    pub due_date: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Set while completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// XP granted on completion.
    pub xp_value: u64,
    /// Created or refined by the mentor.
    #[serde(default)]
    pub is_ai_generated: bool,
    /// Questions the mentor asked about this goal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clarification_questions: Vec<String>,
    /// Player answers, keyed by question.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub clarification_answers: BTreeMap<String, String>,
    /// Ordered sub-steps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<SubTask>>,
}

impl Task {
    /// Create an open quest; its XP value follows from the difficulty.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        category: TaskCategory,
        difficulty: Difficulty,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::generate(),
            title: title.into(),
            description: None,
            category,
            difficulty,
            is_completed: false,
            due_date,
            created_at: now,
            completed_at: None,
            xp_value: difficulty.xp_value(),
            is_ai_generated: false,
            clarification_questions: Vec::new(),
            clarification_answers: BTreeMap::new(),
            sub_tasks: Some(Vec::new()),
        }
    }

    /// Set description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Override the XP value.
    #[must_use]
    pub fn with_xp_value(mut self, xp_value: u64) -> Self {
        self.xp_value = xp_value;
        self
    }

    /// Mark as mentor-generated.
    #[must_use]
    pub fn ai_generated(mut self) -> Self {
        self.is_ai_generated = true;
        self
    }

    /// Look up a sub-step.
    #[must_use]
    pub fn sub_task(&self, id: &SubTaskId) -> Option<&SubTask> {
        self.sub_tasks.as_ref()?.iter().find(|s| &s.id == id)
    }

    /// Look up a sub-step mutably.
    pub fn sub_task_mut(&mut self, id: &SubTaskId) -> Option<&mut SubTask> {
        self.sub_tasks.as_mut()?.iter_mut().find(|s| &s.id == id)
    }

    /// Time from creation to completion.
    #[must_use]
    pub fn time_to_complete(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.created_at)
    }
}

/// Completion counts for the quests currently on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    /// Quests on the board.
    pub total: usize,
    /// Completed quests on the board.
    pub completed: usize,
}

/// The player's quest list, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskBoard(Vec<Task>);

impl TaskBoard {
    /// Empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Board from existing quests.
    #[must_use]
    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self(tasks)
    }

    /// Put a quest at the top of the board.
    pub fn add_front(&mut self, task: Task) {
        self.0.insert(0, task);
    }

    /// Look up a quest.
    #[must_use]
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.0.iter().find(|t| &t.id == id)
    }

    /// Look up a quest mutably.
    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.0.iter_mut().find(|t| &t.id == id)
    }

    /// Remove a quest.
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let index = self.0.iter().position(|t| &t.id == id)?;
        Some(self.0.remove(index))
    }

    /// Quests in board order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.0.iter()
    }

    /// Number of quests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the board is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Titles in board order, for mentor context.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.0.iter().map(|t| t.title.clone()).collect()
    }

    /// The hardest open quest; the one higher on the board wins ties.
    #[must_use]
    pub fn focus_quest(&self) -> Option<&Task> {
        self.0
            .iter()
            .filter(|t| !t.is_completed)
            .fold(None, |best: Option<&Task>, task| match best {
                Some(b) if b.difficulty >= task.difficulty => Some(b),
                _ => Some(task),
            })
    }

    /// Open quests whose title contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Task> {
        let needle = query.to_lowercase();
        self.0
            .iter()
            .filter(|t| !t.is_completed && t.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Completion counts.
    #[must_use]
    pub fn stats(&self) -> TaskStats {
        TaskStats {
            total: self.0.len(),
            completed: self.0.iter().filter(|t| t.is_completed).count(),
        }
    }

    /// Share of completed quests, rounded to a whole percent.
    #[must_use]
    pub fn completion_percent(&self) -> u32 {
        let stats = self.stats();
        if stats.total == 0 {
            return 0;
        }
        (stats.completed as f64 / stats.total as f64 * 100.0).round() as u32
    }

    /// Mean creation-to-completion time over completed quests.
    #[must_use]
    pub fn average_completion_time(&self) -> Option<Duration> {
        let durations: Vec<Duration> = self
            .0
            .iter()
            .filter(|t| t.is_completed)
            .filter_map(Task::time_to_complete)
            .collect();
        if durations.is_empty() {
            return None;
        }
        let total_ms: i64 = durations.iter().map(Duration::num_milliseconds).sum();
        Some(Duration::milliseconds(total_ms / durations.len() as i64))
    }
}

/// Formats a duration as `Xh Ym`, or `Ym` under an hour.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let mins = duration.num_minutes().max(0);
    let hours = mins / 60;
    if hours > 0 {
        format!("{hours}h {}m", mins % 60)
    } else {
        format!("{mins}m")
    }
}

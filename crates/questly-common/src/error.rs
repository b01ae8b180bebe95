//! Error types for Questly.

use thiserror::Error;

use crate::ids::{SubTaskId, TaskId};

/// Top-level error type for quest board operations.
#[derive(Debug, Error)]
pub enum QuestlyError {
    /// No quest with the given id is on the board
    #[error("Quest not found: {0}")]
    TaskNotFound(TaskId),

    /// The quest exists but has no sub-step with the given id
    #[error("Sub-step {sub_task} not found on quest {task}")]
    SubTaskNotFound {
        /// Owning quest
        task: TaskId,
        /// Missing sub-step
        sub_task: SubTaskId,
    },

    /// Quest titles must contain something besides whitespace
    #[error("Quest title is empty")]
    EmptyTitle,

    /// Every clarification question on the quest already has an answer
    #[error("Quest {0} has no open clarification question")]
    NoOpenQuestion(TaskId),
}

/// Result type alias for quest board operations.
pub type QuestlyResult<T> = Result<T, QuestlyError>;

//! Mentor error types.

use thiserror::Error;

/// Errors a mentor call can fail with before the fallback kicks in.
#[derive(Debug, Error)]
pub enum MentorError {
    /// The backend rejected or failed the request.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend answered with no text.
    #[error("Empty response from model {0}")]
    EmptyResponse(String),

    /// A JSON answer did not match the expected shape.
    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for mentor calls.
pub type MentorResult<T> = Result<T, MentorError>;

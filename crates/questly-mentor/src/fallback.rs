//! Timeout-with-fallback policy and the canned answers.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::MentorResult;

/// Default time a mentor call may take.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Chat reply when nothing better is available.
pub const FALLBACK_MESSAGE: &str =
    "I couldn't process that fully. Try focusing on the very first step of your goal right now.";

/// Clarifying question used when the model is unavailable.
pub const FALLBACK_QUESTION: &str = "What is the specific outcome you want to see?";

/// Nudge used when the model is unavailable.
pub const FALLBACK_NUDGE: &str = "Focus on your next victory.";

/// Nudge used when the model answered with nothing.
pub const EMPTY_NUDGE: &str = "Every action gets you closer to mastery.";

/// Media review when the model answered with nothing.
pub const EMPTY_MEDIA_REVIEW: &str = "Reviewed. Let's continue your mission.";

/// Media review used when the model is unavailable.
pub const FALLBACK_MEDIA_REVIEW: &str = "Media processing skipped. Focus on your text quests.";

/// Sub-step ideas used when the model is unavailable (title, description).
pub const FALLBACK_SUGGESTIONS: [(&str, &str); 5] = [
    ("Define first step", "Identify one small action."),
    ("Remove distractions", "Clear your workspace."),
    ("Start 10min timer", "Begin working now."),
    ("Note progress", "Write down what you did."),
    ("Plan tomorrow", "Set the next goal."),
];

/// Await `future`, resolving to `fallback` if it fails or outlives `limit`.
pub async fn with_timeout<T, F>(future: F, fallback: T, limit: Duration) -> T
where
    F: Future<Output = MentorResult<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(Ok(value)) => value,
        Ok(Err(e)) => {
            warn!("Mentor call failed, using fallback: {}", e);
            fallback
        },
        Err(_) => {
            warn!("Mentor call timed out after {:?}, using fallback", limit);
            fallback
        },
    }
}

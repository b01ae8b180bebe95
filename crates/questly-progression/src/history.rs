//! Weekly completion history and streak reconciliation.
//!
//! History is keyed by weekday label, not by date: a completion this Monday
//! lands in the same bucket as one from last Monday. Nothing resets a bucket
//! or the streak when a day is missed.

use chrono::{DateTime, Datelike, Local, Utc, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Weekday labels in storage order.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Short label for a weekday.
#[must_use]
pub fn weekday_label(day: Weekday) -> &'static str {
    WEEKDAY_LABELS[day.num_days_from_sunday() as usize]
}

/// The instant a transaction happens, plus the player's local weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    /// Timestamp used for `unlocked_at` / `completed_at`.
    pub at: DateTime<Utc>,
    /// Weekday whose history bucket is updated.
    pub weekday: Weekday,
}

impl Moment {
    /// Current time, with the weekday taken from local time.
    #[must_use]
    pub fn now() -> Self {
        let local = Local::now();
        Self {
            at: local.with_timezone(&Utc),
            weekday: local.weekday(),
        }
    }

    /// Explicit moment.
    #[must_use]
    pub const fn new(at: DateTime<Utc>, weekday: Weekday) -> Self {
        Self { at, weekday }
    }
}

/// Completions recorded against one weekday label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyProgress {
    /// Weekday label (`Sun`..`Sat`).
    pub date: String,
    /// Major quest completions.
    pub count: u64,
}

/// Seven weekday buckets in `Sun..Sat` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklyHistory(Vec<DailyProgress>);

impl Default for WeeklyHistory {
    fn default() -> Self {
        Self(
            WEEKDAY_LABELS
                .iter()
                .map(|label| DailyProgress {
                    date: (*label).to_string(),
                    count: 0,
                })
                .collect(),
        )
    }
}

impl WeeklyHistory {
    /// All-zero history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild as exactly the seven weekday buckets, keeping counts for
    /// recognised labels. Unknown labels are dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut fixed = Self::default();
        for entry in self.0 {
            if let Some(slot) = fixed.0.iter_mut().find(|d| d.date == entry.date) {
                slot.count = slot.count.saturating_add(entry.count);
            }
        }
        fixed
    }

    /// Buckets in storage order.
    #[must_use]
    pub fn days(&self) -> &[DailyProgress] {
        &self.0
    }

    /// Completions logged for a weekday.
    #[must_use]
    pub fn count_for(&self, day: Weekday) -> u64 {
        let label = weekday_label(day);
        self.0
            .iter()
            .find(|d| d.date == label)
            .map_or(0, |d| d.count)
    }

    /// Sum of all buckets.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0, |sum, d| sum.saturating_add(d.count))
    }

    /// Log one major quest completion on `day`.
    ///
    /// Returns `true` when this was the first completion logged in that
    /// bucket, which is what advances the streak.
    pub fn record_completion(&mut self, day: Weekday) -> bool {
        let label = weekday_label(day);
        match self.0.iter_mut().find(|d| d.date == label) {
            Some(entry) => {
                let first_today = entry.count == 0;
                entry.count = entry.count.saturating_add(1);
                first_today
            },
            None => false,
        }
    }
}

/// Streak and history after one completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakUpdate {
    /// New streak value.
    pub streak: u64,
    /// Updated history.
    pub history: WeeklyHistory,
    /// Whether the streak advanced.
    pub advanced: bool,
}

/// Apply a major quest completion on `day` to the streak and history.
///
/// The streak only moves on the first completion of the day; later
/// completions the same day only raise the bucket count.
#[must_use]
pub fn reconcile_completion(streak: u64, history: &WeeklyHistory, day: Weekday) -> StreakUpdate {
    let mut history = history.clone();
    let advanced = history.record_completion(day);
    let streak = if advanced {
        streak.saturating_add(1)
    } else {
        streak
    };

    if advanced {
        debug!(streak, day = weekday_label(day), "Streak advanced");
    }

    StreakUpdate {
        streak,
        history,
        advanced,
    }
}

//! Player profile and level math.

use serde::{Deserialize, Serialize};

use crate::badge::Badge;
use crate::rank::{rank_and_tier, Rank, Tier};
use crate::settings::Settings;

/// Lifetime XP needed per level.
pub const XP_PER_LEVEL: u64 = 500;

/// Level reached with the given lifetime XP (levels start at 1).
#[must_use]
pub const fn level_for_xp(xp: u64) -> u64 {
    xp / XP_PER_LEVEL + 1
}

/// Progress through the current level, 0-100.
#[must_use]
pub fn level_progress_percent(xp: u64) -> f32 {
    (xp % XP_PER_LEVEL) as f32 / (XP_PER_LEVEL as f32 / 100.0)
}

/// The player's persistent state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Lifetime XP.
    pub xp: u64,
    /// Derived from `xp`.
    pub level: u64,
    /// Consecutive-day completion counter.
    pub streak: u64,
    /// Major quest completions.
    pub total_completed: u64,
    /// Unlocked badges in unlock order.
    #[serde(default)]
    pub badges: Vec<Badge>,
    /// Player settings.
    #[serde(default)]
    pub settings: Settings,
    /// Avatar URL or data URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    /// Whether onboarding has finished.
    #[serde(default)]
    pub onboarding_complete: bool,
    /// Whether the tutorial has finished.
    #[serde(default)]
    pub tutorial_complete: bool,
    /// XP counted toward ranked progression.
    #[serde(rename = "rankXP", default)]
    pub rank_xp: u64,
    /// Derived from `rank_xp`.
    #[serde(default)]
    pub current_rank: Rank,
    /// Derived from `rank_xp`.
    #[serde(default)]
    pub current_tier: Tier,
    /// Best `"<Rank> <Tier>"` label ever reached.
    #[serde(default = "default_highest_rank")]
    pub highest_rank: String,
}

fn default_highest_rank() -> String {
    rank_and_tier(0).label()
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: String::new(),
            xp: 0,
            level: 1,
            streak: 0,
            total_completed: 0,
            badges: Vec::new(),
            settings: Settings::default(),
            profile_picture: None,
            onboarding_complete: false,
            tutorial_complete: false,
            rank_xp: 0,
            current_rank: Rank::Iron,
            current_tier: Tier::Four,
            highest_rank: default_highest_rank(),
        }
    }
}

impl UserProfile {
    /// Create a fresh profile for a named player.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether the badge with this id is unlocked.
    #[must_use]
    pub fn has_badge(&self, id: &str) -> bool {
        self.badges.iter().any(|b| b.id.as_str() == id)
    }

    /// `"<Rank> <Tier>"` label of the stored rank.
    #[must_use]
    pub fn rank_label(&self) -> String {
        crate::rank::rank_label(self.current_rank, self.current_tier)
    }
}

//! Badge catalog and evaluator.
//!
//! Badges are copied out of a fixed catalog the first time their unlock rule
//! holds and are never touched again afterwards.

use ahash::AHashSet;
use chrono::{DateTime, Utc};
use questly_common::BadgeId;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profile::UserProfile;
use crate::task::TaskStats;

/// Unlocked badge as stored on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// Catalog key.
    pub id: BadgeId,
    /// Display name.
    pub name: String,
    /// Emoji icon.
    pub icon: String,
    /// What the player did to earn it.
    pub description: String,
    /// Bonus XP granted on unlock.
    #[serde(rename = "rewardXP")]
    pub reward_xp: u64,
    /// When the badge was unlocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
}

/// Unlock rule for a catalog badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeRule {
    /// Lifetime major quest completions reach the threshold.
    TotalCompleted(u64),
    /// Streak reaches the threshold.
    Streak(u64),
    /// Completed quests currently on the board reach the threshold.
    BoardCompleted(usize),
}

impl BadgeRule {
    /// Checks the rule against already-updated profile fields.
    #[must_use]
    pub fn is_met(self, profile: &UserProfile, stats: &TaskStats) -> bool {
        match self {
            Self::TotalCompleted(min) => profile.total_completed >= min,
            Self::Streak(min) => profile.streak >= min,
            Self::BoardCompleted(min) => stats.completed >= min,
        }
    }
}

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeTemplate {
    /// Catalog key.
    pub id: BadgeId,
    /// Display name.
    pub name: String,
    /// Emoji icon.
    pub icon: String,
    /// Description.
    pub description: String,
    /// Bonus XP granted on unlock.
    pub reward_xp: u64,
    /// Unlock rule.
    pub rule: BadgeRule,
}

impl BadgeTemplate {
    /// Create a catalog entry.
    #[must_use]
    pub fn new(
        id: impl Into<BadgeId>,
        name: impl Into<String>,
        icon: impl Into<String>,
        description: impl Into<String>,
        reward_xp: u64,
        rule: BadgeRule,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            description: description.into(),
            reward_xp,
            rule,
        }
    }

    /// Stamp a profile badge from this template.
    #[must_use]
    pub fn unlock(&self, at: DateTime<Utc>) -> Badge {
        Badge {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            description: self.description.clone(),
            reward_xp: self.reward_xp,
            unlocked_at: Some(at),
        }
    }
}

/// Ordered set of badge templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeCatalog {
    templates: Vec<BadgeTemplate>,
}

impl Default for BadgeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl BadgeCatalog {
    /// Create a catalog from templates, in evaluation order.
    #[must_use]
    pub fn new(templates: Vec<BadgeTemplate>) -> Self {
        Self { templates }
    }

    /// The catalog shipped with the game.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            BadgeTemplate::new(
                "1",
                "First Quest",
                "🎯",
                "Complete your first quest.",
                50,
                BadgeRule::TotalCompleted(1),
            ),
            BadgeTemplate::new(
                "2",
                "Week Warrior",
                "🔥",
                "Keep a 7-day streak alive.",
                250,
                BadgeRule::Streak(7),
            ),
        ])
    }

    /// Templates in evaluation order.
    #[must_use]
    pub fn templates(&self) -> &[BadgeTemplate] {
        &self.templates
    }

    /// Look up a template by id.
    #[must_use]
    pub fn get(&self, id: &BadgeId) -> Option<&BadgeTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Outcome of one evaluator pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BadgeEvaluation {
    /// Profile badges with new unlocks appended.
    pub badges: Vec<Badge>,
    /// Badges unlocked by this pass, in catalog order.
    pub newly_unlocked: Vec<Badge>,
    /// Sum of `reward_xp` over `newly_unlocked`.
    pub bonus_xp: u64,
}

/// Determine which catalog badges the profile newly qualifies for.
///
/// Pure: the caller applies `bonus_xp` and stores `badges`. Badges already on
/// the profile are skipped, so running this again on the result unlocks
/// nothing.
#[must_use]
pub fn evaluate(
    profile: &UserProfile,
    stats: &TaskStats,
    catalog: &BadgeCatalog,
    now: DateTime<Utc>,
) -> BadgeEvaluation {
    let unlocked: AHashSet<&BadgeId> = profile.badges.iter().map(|b| &b.id).collect();

    let newly_unlocked: Vec<Badge> = catalog
        .templates()
        .iter()
        .filter(|t| !unlocked.contains(&t.id))
        .filter(|t| t.rule.is_met(profile, stats))
        .map(|t| t.unlock(now))
        .collect();

    for badge in &newly_unlocked {
        info!(badge = %badge.id, name = %badge.name, "Badge unlocked");
    }

    let bonus_xp = newly_unlocked.iter().map(|b| b.reward_xp).sum();
    let mut badges = profile.badges.clone();
    badges.extend(newly_unlocked.iter().cloned());

    BadgeEvaluation {
        badges,
        newly_unlocked,
        bonus_xp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn test_first_quest_unlocks() {
        let mut profile = UserProfile::default();
        profile.total_completed = 1;

        let result = evaluate(&profile, &TaskStats::default(), &BadgeCatalog::standard(), at());

        assert_eq!(result.newly_unlocked.len(), 1);
        assert_eq!(result.newly_unlocked[0].id, BadgeId::from("1"));
        assert_eq!(result.newly_unlocked[0].unlocked_at, Some(at()));
        assert_eq!(result.bonus_xp, 50);
        assert_eq!(result.badges.len(), 1);
    }

    #[test]
    fn test_multiple_unlocks_in_one_pass() {
        let mut profile = UserProfile::default();
        profile.total_completed = 3;
        profile.streak = 7;

        let result = evaluate(&profile, &TaskStats::default(), &BadgeCatalog::standard(), at());

        let ids: Vec<&str> = result.newly_unlocked.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(result.bonus_xp, 300);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut profile = UserProfile::default();
        profile.total_completed = 1;
        profile.streak = 9;
        let catalog = BadgeCatalog::standard();

        let first = evaluate(&profile, &TaskStats::default(), &catalog, at());
        profile.badges = first.badges;

        let second = evaluate(&profile, &TaskStats::default(), &catalog, at());
        assert!(second.newly_unlocked.is_empty());
        assert_eq!(second.bonus_xp, 0);
        assert_eq!(second.badges, profile.badges);
    }

    #[test]
    fn test_nothing_unlocks_for_fresh_profile() {
        let result = evaluate(
            &UserProfile::default(),
            &TaskStats::default(),
            &BadgeCatalog::standard(),
            at(),
        );
        assert!(result.newly_unlocked.is_empty());
        assert!(result.badges.is_empty());
    }

    #[test]
    fn test_board_rule_uses_task_stats() {
        let catalog = BadgeCatalog::new(vec![BadgeTemplate::new(
            "board",
            "Clean Sweep",
            "🧹",
            "Have five finished quests on the board.",
            20,
            BadgeRule::BoardCompleted(5),
        )]);
        let profile = UserProfile::default();

        let short = TaskStats {
            total: 6,
            completed: 4,
        };
        assert!(evaluate(&profile, &short, &catalog, at()).newly_unlocked.is_empty());

        let enough = TaskStats {
            total: 6,
            completed: 5,
        };
        assert_eq!(evaluate(&profile, &enough, &catalog, at()).bonus_xp, 20);
    }

    #[test]
    fn test_badge_json_field_names() {
        let badge = BadgeCatalog::standard().templates()[0].unlock(at());
        let json = serde_json::to_value(&badge).expect("serialize");
        assert_eq!(json["rewardXP"], 50);
        assert!(json["unlockedAt"].is_string());
    }
}

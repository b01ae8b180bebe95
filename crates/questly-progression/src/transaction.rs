//! Experience transaction processor.
//!
//! One call handles one XP-changing event (quest toggled, sub-step toggled,
//! mastery reward). Inputs are borrowed and never mutated; the caller gets
//! back a new profile and history plus the events to present.

use tracing::{debug, info};

use crate::badge::{evaluate, BadgeCatalog};
use crate::events::{RankDirection, TransitionEvent};
use crate::history::{reconcile_completion, Moment, WeeklyHistory};
use crate::profile::{level_for_xp, UserProfile};
use crate::rank::{ordinal_from_label, rank_and_tier};
use crate::task::TaskStats;

/// A signed XP change and whether it comes from a major quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpChange {
    /// Signed amount; negative for reversals.
    pub delta: i64,
    /// Major quests move the streak, history and `total_completed`.
    pub is_major_quest: bool,
}

impl XpChange {
    /// Completing (positive `xp`) or un-completing (negative) a quest.
    #[must_use]
    pub const fn major(delta: i64) -> Self {
        Self {
            delta,
            is_major_quest: true,
        }
    }

    /// Sub-step toggles and mastery rewards.
    #[must_use]
    pub const fn minor(delta: i64) -> Self {
        Self {
            delta,
            is_major_quest: false,
        }
    }
}

/// Result of one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutcome {
    /// Updated profile.
    pub profile: UserProfile,
    /// Updated weekly history.
    pub history: WeeklyHistory,
    /// Events in emission order.
    pub events: Vec<TransitionEvent>,
}

/// Add a signed delta to a counter, clamping at zero.
#[must_use]
pub fn clamped_add(value: u64, delta: i64) -> u64 {
    if delta >= 0 {
        value.saturating_add(delta.unsigned_abs())
    } else {
        value.saturating_sub(delta.unsigned_abs())
    }
}

/// Move the profile to `new_rank_xp`, recomputing rank, tier and the
/// high-water mark, and emit a rank event if the ordinal changed.
///
/// The high-water check compares the unclamped ordinal with the ordinal
/// parsed from the stored label. Past Mythic I the written label wraps
/// through the Mythic tiers, so it can read lower than before.
fn move_rank(profile: &mut UserProfile, new_rank_xp: u64, events: &mut Vec<TransitionEvent>) {
    let old_status = rank_and_tier(profile.rank_xp);
    let new_status = rank_and_tier(new_rank_xp);

    if new_status.ordinal != old_status.ordinal {
        let direction = if new_rank_xp > profile.rank_xp {
            RankDirection::Up
        } else {
            RankDirection::Down
        };
        let label = new_status.label();
        info!(?direction, rank = %label, "Rank changed");
        events.push(TransitionEvent::RankChanged { direction, label });
    }

    profile.rank_xp = new_rank_xp;
    profile.current_rank = new_status.rank;
    profile.current_tier = new_status.tier;

    if new_status.ordinal > ordinal_from_label(&profile.highest_rank) {
        profile.highest_rank = new_status.label();
    }
}

/// Apply one XP-changing event.
///
/// Rank XP, rank and the high-water mark only move in ranked mode. Badge
/// rules see the profile after this event's XP, streak and completion
/// changes, and their bonus XP is folded in before returning.
#[must_use]
pub fn apply_xp_delta(
    profile: &UserProfile,
    history: &WeeklyHistory,
    stats: &TaskStats,
    catalog: &BadgeCatalog,
    change: XpChange,
    moment: Moment,
) -> TransactionOutcome {
    let XpChange {
        delta,
        is_major_quest,
    } = change;
    let ranked = profile.settings.is_ranked_mode;
    let mut next = profile.clone();
    let mut history = history.clone();
    let mut events = Vec::new();

    debug!(delta, is_major_quest, ranked, "Applying XP change");

    next.xp = clamped_add(profile.xp, delta);
    next.level = level_for_xp(next.xp);

    if ranked {
        events.push(TransitionEvent::XpChanged {
            amount: delta.unsigned_abs(),
            is_gain: delta > 0,
        });
        let new_rank_xp = clamped_add(profile.rank_xp, delta);
        move_rank(&mut next, new_rank_xp, &mut events);
    }

    if is_major_quest && delta > 0 {
        let update = reconcile_completion(next.streak, &history, moment.weekday);
        next.streak = update.streak;
        history = update.history;
    }

    if is_major_quest {
        next.total_completed = clamped_add(next.total_completed, if delta > 0 { 1 } else { -1 });
    }

    let unlocks = evaluate(&next, stats, catalog, moment.at);
    if !unlocks.newly_unlocked.is_empty() {
        next.badges = unlocks.badges;
        next.xp = next.xp.saturating_add(unlocks.bonus_xp);
        next.level = level_for_xp(next.xp);

        events.extend(
            unlocks
                .newly_unlocked
                .into_iter()
                .map(|badge| TransitionEvent::BadgeUnlocked { badge }),
        );

        if ranked {
            let boosted = next.rank_xp.saturating_add(unlocks.bonus_xp);
            move_rank(&mut next, boosted, &mut events);
        }
    }

    TransactionOutcome {
        profile: next,
        history,
        events,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::badge::BadgeTemplate;
    use crate::rank::{Rank, Tier, RANK_COUNT, TIER_COUNT, XP_PER_TIER};
    use chrono::{DateTime, TimeZone, Utc, Weekday};
    use proptest::prelude::*;

    fn moment() -> Moment {
        let at: DateTime<Utc> = Utc
            .with_ymd_and_hms(2024, 6, 3, 18, 0, 0)
            .single()
            .expect("valid timestamp");
        Moment::new(at, Weekday::Mon)
    }

    fn no_badges() -> BadgeCatalog {
        BadgeCatalog::new(Vec::new())
    }

    /// Profile that already owns the "first quest" badge, so completions
    /// don't pull in bonus XP.
    fn veteran() -> UserProfile {
        let mut profile = UserProfile::default();
        let template = BadgeCatalog::standard().templates()[0].clone();
        profile.badges.push(template.unlock(moment().at));
        profile
    }

    fn apply(profile: &UserProfile, history: &WeeklyHistory, change: XpChange) -> TransactionOutcome {
        apply_xp_delta(
            profile,
            history,
            &TaskStats::default(),
            &BadgeCatalog::standard(),
            change,
            moment(),
        )
    }

    #[test]
    fn test_first_completion_of_the_day() {
        let out = apply(&veteran(), &WeeklyHistory::new(), XpChange::major(500));

        assert_eq!(out.profile.xp, 500);
        assert_eq!(out.profile.rank_xp, 500);
        assert_eq!(out.profile.level, 2);
        assert_eq!(out.profile.total_completed, 1);
        assert_eq!(out.profile.streak, 1);
        assert_eq!(out.history.count_for(Weekday::Mon), 1);
        assert_eq!(out.profile.current_rank, Rank::Iron);
        assert_eq!(out.profile.current_tier, Tier::Four);
        assert_eq!(
            out.events,
            vec![TransitionEvent::XpChanged {
                amount: 500,
                is_gain: true
            }]
        );
    }

    #[test]
    fn test_second_completion_same_day_keeps_streak() {
        let first = apply(&veteran(), &WeeklyHistory::new(), XpChange::major(500));
        let second = apply(&first.profile, &first.history, XpChange::major(500));

        assert_eq!(second.profile.total_completed, 2);
        assert_eq!(second.profile.streak, 1);
        assert_eq!(second.history.count_for(Weekday::Mon), 2);
        assert_eq!(second.profile.rank_xp, 1000);
        assert!(second.events.contains(&TransitionEvent::RankChanged {
            direction: RankDirection::Up,
            label: "Iron III".to_string(),
        }));
        assert_eq!(second.profile.highest_rank, "Iron III");
    }

    #[test]
    fn test_reversal_clamps_at_zero() {
        let out = apply(&veteran(), &WeeklyHistory::new(), XpChange::major(-150));

        assert_eq!(out.profile.xp, 0);
        assert_eq!(out.profile.rank_xp, 0);
        assert_eq!(out.profile.total_completed, 0);
        assert_eq!(out.profile.streak, 0);
        assert_eq!(out.history.total(), 0);
        assert_eq!(
            out.events,
            vec![TransitionEvent::XpChanged {
                amount: 150,
                is_gain: false
            }]
        );
    }

    #[test]
    fn test_rank_down_keeps_highest_rank() {
        let mut profile = veteran();
        profile.xp = 1050;
        profile.rank_xp = 1050;
        profile.total_completed = 4;
        profile.highest_rank = "Iron III".to_string();

        let out = apply(&profile, &WeeklyHistory::new(), XpChange::major(-150));

        assert_eq!(out.profile.rank_xp, 900);
        assert_eq!(out.profile.current_tier, Tier::Four);
        assert_eq!(out.profile.highest_rank, "Iron III");
        assert_eq!(out.profile.total_completed, 3);
        assert!(out.events.contains(&TransitionEvent::RankChanged {
            direction: RankDirection::Down,
            label: "Iron IV".to_string(),
        }));
    }

    #[test]
    fn test_unranked_mode_leaves_rank_alone() {
        let mut profile = veteran();
        profile.settings.is_ranked_mode = false;

        let out = apply(&profile, &WeeklyHistory::new(), XpChange::major(1500));

        assert_eq!(out.profile.xp, 1500);
        assert_eq!(out.profile.rank_xp, 0);
        assert_eq!(out.profile.highest_rank, "Iron IV");
        assert!(out.events.is_empty());
    }

    #[test]
    fn test_minor_change_skips_streak_and_totals() {
        let out = apply(&veteran(), &WeeklyHistory::new(), XpChange::minor(5));

        assert_eq!(out.profile.xp, 5);
        assert_eq!(out.profile.total_completed, 0);
        assert_eq!(out.profile.streak, 0);
        assert_eq!(out.history.total(), 0);
    }

    #[test]
    fn test_badge_bonus_applied_to_xp_and_rank_xp() {
        let out = apply(&UserProfile::default(), &WeeklyHistory::new(), XpChange::major(150));

        // 150 for the quest plus 50 for "First Quest"
        assert_eq!(out.profile.xp, 200);
        assert_eq!(out.profile.rank_xp, 200);
        assert!(out.profile.has_badge("1"));
        assert!(matches!(
            out.events.last(),
            Some(TransitionEvent::BadgeUnlocked { badge }) if badge.id.as_str() == "1"
        ));
    }

    fn bonus_catalog(bonus_xp: u64) -> BadgeCatalog {
        BadgeCatalog::new(vec![BadgeTemplate::new(
            "big",
            "Big Bonus",
            "💎",
            "Test badge.",
            bonus_xp,
            crate::badge::BadgeRule::TotalCompleted(1),
        )])
    }

    #[test]
    fn test_badge_bonus_can_cross_a_tier() {
        let out = apply_xp_delta(
            &UserProfile::default(),
            &WeeklyHistory::new(),
            &TaskStats::default(),
            &bonus_catalog(600),
            XpChange::major(500),
            moment(),
        );

        assert_eq!(out.profile.rank_xp, 1100);
        assert_eq!(out.profile.current_tier, Tier::Three);
        assert_eq!(out.profile.highest_rank, "Iron III");
        assert!(matches!(
            out.events.last(),
            Some(TransitionEvent::RankChanged {
                direction: RankDirection::Up,
                ..
            })
        ));
    }

    /// Bonus XP is ranked in a second step, so one completion can report
    /// two rank-ups: one for the quest XP and one for the badge bonus.
    #[test]
    fn test_badge_bonus_emits_its_own_rank_change() {
        let out = apply_xp_delta(
            &UserProfile::default(),
            &WeeklyHistory::new(),
            &TaskStats::default(),
            &bonus_catalog(1000),
            XpChange::major(1000),
            moment(),
        );

        let labels: Vec<&str> = out
            .events
            .iter()
            .filter_map(|e| match e {
                TransitionEvent::RankChanged { label, .. } => Some(label.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["Iron III", "Iron II"]);
        assert_eq!(out.profile.highest_rank, "Iron II");
    }

    #[test]
    fn test_highest_rank_label_wraps_past_mythic() {
        let mut profile = UserProfile::default();
        let mut history = WeeklyHistory::new();
        let mut seen = Vec::new();

        for delta in [27_500, 1000, 1000] {
            let out = apply_xp_delta(
                &profile,
                &history,
                &TaskStats::default(),
                &no_badges(),
                XpChange::minor(delta),
                moment(),
            );
            profile = out.profile;
            history = out.history;
            seen.push(profile.highest_rank.clone());
        }

        assert_eq!(profile.rank_xp, 29_500);
        assert_eq!(profile.current_rank, Rank::Mythic);
        assert_eq!(seen, vec!["Mythic I", "Mythic IV", "Mythic III"]);
    }

    #[test]
    fn test_week_warrior_unlocks_on_seventh_day() {
        let mut profile = veteran();
        profile.streak = 6;

        let out = apply(&profile, &WeeklyHistory::new(), XpChange::major(50));

        assert_eq!(out.profile.streak, 7);
        assert!(out.profile.has_badge("2"));
        assert_eq!(out.profile.xp, 50 + 250);
    }

    #[test]
    fn test_clamped_add() {
        assert_eq!(clamped_add(10, -25), 0);
        assert_eq!(clamped_add(10, 5), 15);
        assert_eq!(clamped_add(u64::MAX, 1), u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_counters_track_clamped_model(
            changes in prop::collection::vec((-2000i64..2000, any::<bool>()), 0..40)
        ) {
            let mythic_ceiling = XP_PER_TIER * TIER_COUNT * RANK_COUNT;
            let mut profile = UserProfile::default();
            let mut history = WeeklyHistory::new();
            let mut model_xp: i64 = 0;
            let mut model_completed: i64 = 0;

            for (delta, major) in changes {
                let change = XpChange { delta, is_major_quest: major };
                let out = apply_xp_delta(
                    &profile, &history, &TaskStats::default(), &no_badges(), change, moment(),
                );
                model_xp = (model_xp + delta).max(0);
                if major {
                    model_completed = (model_completed + if delta > 0 { 1 } else { -1 }).max(0);
                }

                prop_assert_eq!(out.profile.xp, model_xp as u64);
                prop_assert_eq!(out.profile.rank_xp, model_xp as u64);
                prop_assert_eq!(out.profile.total_completed, model_completed as u64);
                prop_assert!(out.profile.streak >= profile.streak);
                prop_assert!(out.profile.streak <= 1);
                if out.profile.rank_xp < mythic_ceiling {
                    prop_assert!(
                        ordinal_from_label(&out.profile.highest_rank)
                            >= ordinal_from_label(&profile.highest_rank)
                    );
                }

                profile = out.profile;
                history = out.history;
            }
        }
    }
}

//! Rank table and progression calculator.
//!
//! Ranked progression is a flat ladder of tier steps. Every `XP_PER_TIER`
//! rank XP buys one step; four steps make a rank. The displayed rank
//! saturates at Mythic, while the absolute ordinal keeps counting so that
//! before/after and high-water-mark comparisons stay strict.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank XP cost of a single tier step.
pub const XP_PER_TIER: u64 = 1000;

/// Number of tiers within one rank.
pub const TIER_COUNT: u64 = 4;

/// Number of ranks on the ladder.
pub const RANK_COUNT: u64 = 7;

/// Competitive rank, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Rank {
    /// Starting rank.
    #[default]
    Iron,
    /// Second rank.
    Bronze,
    /// Third rank.
    Silver,
    /// Fourth rank.
    Gold,
    /// Fifth rank.
    Platinum,
    /// Sixth rank.
    Diamond,
    /// Top rank; progression saturates here.
    Mythic,
}

impl Rank {
    /// All ranks in ladder order.
    pub const ALL: [Self; RANK_COUNT as usize] = [
        Self::Iron,
        Self::Bronze,
        Self::Silver,
        Self::Gold,
        Self::Platinum,
        Self::Diamond,
        Self::Mythic,
    ];

    /// Position on the ladder (Iron = 0).
    #[must_use]
    pub const fn index(self) -> u64 {
        self as u64
    }

    /// Display name, as used in rank labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Iron => "Iron",
            Self::Bronze => "Bronze",
            Self::Silver => "Silver",
            Self::Gold => "Gold",
            Self::Platinum => "Platinum",
            Self::Diamond => "Diamond",
            Self::Mythic => "Mythic",
        }
    }

    /// Parses a display name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|rank| rank.name() == name)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Tier within a rank. IV is the entry tier, I the last before promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Tier {
    /// Entry tier.
    #[default]
    #[serde(rename = "IV")]
    Four,
    /// Second tier.
    #[serde(rename = "III")]
    Three,
    /// Third tier.
    #[serde(rename = "II")]
    Two,
    /// Final tier.
    #[serde(rename = "I")]
    One,
}

impl Tier {
    /// All tiers in ladder order.
    pub const ALL: [Self; TIER_COUNT as usize] = [Self::Four, Self::Three, Self::Two, Self::One];

    /// Position within the rank (IV = 0).
    #[must_use]
    pub const fn index(self) -> u64 {
        self as u64
    }

    /// Roman numeral label.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Four => "IV",
            Self::Three => "III",
            Self::Two => "II",
            Self::One => "I",
        }
    }

    /// Parses a roman numeral label.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.name() == name)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of mapping rank XP onto the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RankStatus {
    /// Displayed rank (clamped at Mythic).
    pub rank: Rank,
    /// Displayed tier.
    pub tier: Tier,
    /// Unclamped count of tier steps.
    pub ordinal: u64,
}

impl RankStatus {
    /// `"<Rank> <Tier>"` label.
    #[must_use]
    pub fn label(&self) -> String {
        rank_label(self.rank, self.tier)
    }
}

/// Formats a `"<Rank> <Tier>"` label.
#[must_use]
pub fn rank_label(rank: Rank, tier: Tier) -> String {
    format!("{rank} {tier}")
}

/// Maps cumulative rank XP to its rank, tier and absolute ordinal.
#[must_use]
pub fn rank_and_tier(rank_xp: u64) -> RankStatus {
    let total_tier_steps = rank_xp / XP_PER_TIER;
    let rank_index = (total_tier_steps / TIER_COUNT).min(RANK_COUNT - 1);
    let tier_index = total_tier_steps % TIER_COUNT;

    RankStatus {
        rank: Rank::ALL[rank_index as usize],
        tier: Tier::ALL[tier_index as usize],
        ordinal: total_tier_steps,
    }
}

/// Parses a stored `"<Rank> <Tier>"` label back to its ordinal.
///
/// Anything that is not exactly two known tokens is treated as "no prior
/// record" and yields 0.
#[must_use]
pub fn ordinal_from_label(label: &str) -> u64 {
    let parts: Vec<&str> = label.split(' ').collect();
    let [rank, tier] = parts.as_slice() else {
        return 0;
    };

    match (Rank::from_name(rank), Tier::from_name(tier)) {
        (Some(rank), Some(tier)) => rank.index() * TIER_COUNT + tier.index(),
        _ => 0,
    }
}

/// Rank XP earned inside the current tier.
#[must_use]
pub const fn tier_progress(rank_xp: u64) -> u64 {
    rank_xp % XP_PER_TIER
}

/// Rank XP still needed to reach the next tier step.
#[must_use]
pub const fn xp_to_next_tier(rank_xp: u64) -> u64 {
    XP_PER_TIER - tier_progress(rank_xp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rank_and_tier_examples() {
        assert_eq!(
            rank_and_tier(0),
            RankStatus {
                rank: Rank::Iron,
                tier: Tier::Four,
                ordinal: 0
            }
        );
        assert_eq!(
            rank_and_tier(3999),
            RankStatus {
                rank: Rank::Iron,
                tier: Tier::One,
                ordinal: 3
            }
        );
        assert_eq!(
            rank_and_tier(4000),
            RankStatus {
                rank: Rank::Bronze,
                tier: Tier::Four,
                ordinal: 4
            }
        );
    }

    #[test]
    fn test_saturates_at_mythic() {
        let top = rank_and_tier(27_999);
        assert_eq!(top.rank, Rank::Mythic);
        assert_eq!(top.tier, Tier::One);
        assert_eq!(top.ordinal, 27);

        let beyond = rank_and_tier(29_000);
        assert_eq!(beyond.rank, Rank::Mythic);
        // rank index clamps, tier index is 29 % 4
        assert_eq!(beyond.tier, Tier::Three);
        assert_eq!(beyond.ordinal, 29);
    }

    #[test]
    fn test_labels() {
        assert_eq!(rank_and_tier(5500).label(), "Bronze III");
        assert_eq!(rank_and_tier(27_000).label(), "Mythic I");
    }

    #[test]
    fn test_ordinal_from_label() {
        assert_eq!(ordinal_from_label("Iron IV"), 0);
        assert_eq!(ordinal_from_label("Iron I"), 3);
        assert_eq!(ordinal_from_label("Gold II"), 14);
        assert_eq!(ordinal_from_label("Mythic I"), 27);
    }

    #[test]
    fn test_ordinal_from_malformed_label() {
        assert_eq!(ordinal_from_label(""), 0);
        assert_eq!(ordinal_from_label("Gold"), 0);
        assert_eq!(ordinal_from_label("Gold II extra"), 0);
        assert_eq!(ordinal_from_label("Wood II"), 0);
        assert_eq!(ordinal_from_label("Gold V"), 0);
    }

    #[test]
    fn test_tier_progress() {
        assert_eq!(tier_progress(4250), 250);
        assert_eq!(xp_to_next_tier(4250), 750);
        assert_eq!(xp_to_next_tier(0), XP_PER_TIER);
    }

    #[test]
    fn test_tier_serializes_as_roman_numeral() {
        let json = serde_json::to_string(&Tier::Three).expect("serialize");
        assert_eq!(json, "\"III\"");
    }

    proptest! {
        #[test]
        fn prop_status_in_domain(xp in any::<u64>()) {
            let status = rank_and_tier(xp);
            prop_assert!(Rank::ALL.contains(&status.rank));
            prop_assert!(Tier::ALL.contains(&status.tier));
        }

        #[test]
        fn prop_ordinal_monotonic(a in 0u64..10_000_000, b in 0u64..10_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank_and_tier(hi).ordinal >= rank_and_tier(lo).ordinal);
        }

        #[test]
        fn prop_saturation(extra in 0u64..10_000_000) {
            let xp = (RANK_COUNT - 1) * TIER_COUNT * XP_PER_TIER + extra;
            let status = rank_and_tier(xp);
            prop_assert_eq!(status.rank, Rank::Mythic);
            prop_assert_eq!(status.ordinal, xp / XP_PER_TIER);
        }

        #[test]
        fn prop_label_round_trips_below_saturation(xp in 0u64..(RANK_COUNT * TIER_COUNT * XP_PER_TIER)) {
            let status = rank_and_tier(xp);
            prop_assert_eq!(ordinal_from_label(&status.label()), status.ordinal);
        }
    }
}

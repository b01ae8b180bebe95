//! Transition events handed to the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::badge::Badge;

/// Direction of a rank change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankDirection {
    /// Promotion.
    Up,
    /// Demotion.
    Down,
}

/// Something the UI should animate or announce after a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TransitionEvent {
    /// Rank XP moved.
    #[serde(rename_all = "camelCase")]
    XpChanged {
        /// Absolute size of the change.
        amount: u64,
        /// Whether XP was gained.
        is_gain: bool,
    },
    /// Rank ordinal changed.
    RankChanged {
        /// Which way the rank moved.
        direction: RankDirection,
        /// `"<Rank> <Tier>"` label after the change.
        label: String,
    },
    /// A badge was unlocked.
    BadgeUnlocked {
        /// The stamped badge.
        badge: Badge,
    },
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::XpChanged { amount, is_gain } => {
                let sign = if *is_gain { '+' } else { '-' };
                write!(f, "{sign}{amount} RP")
            },
            Self::RankChanged { direction, label } => match direction {
                RankDirection::Up => write!(f, "Rank Up! {label}"),
                RankDirection::Down => write!(f, "Rank Shifted: {label}"),
            },
            Self::BadgeUnlocked { badge } => write!(
                f,
                "Mastery Unlocked! {} {} (+{} RP)",
                badge.icon, badge.name, badge.reward_xp
            ),
        }
    }
}

//! # Questly Progression
//!
//! Progression systems for Questly.
//!
//! This crate provides the pure game logic behind the quest board:
//! - Rank table and progression calculator (rank, tier, absolute ordinal)
//! - Badge catalog and evaluator
//! - Weekly history and streak reconciliation
//! - Experience transaction processor
//! - Quest board, settings and the player profile
//! - Mentor conversation transcript
//! - Quest session orchestrating all of the above

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod badge;
pub mod chat;
pub mod events;
pub mod history;
pub mod profile;
pub mod rank;
pub mod session;
pub mod settings;
pub mod task;
pub mod transaction;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::badge::*;
    pub use crate::chat::*;
    pub use crate::events::*;
    pub use crate::history::*;
    pub use crate::profile::*;
    pub use crate::rank::*;
    pub use crate::session::*;
    pub use crate::settings::*;
    pub use crate::task::*;
    pub use crate::transaction::*;
}

pub use prelude::*;

//! # Questly Common
//!
//! Common types and shared abstractions for Questly.
//!
//! This crate provides foundational types used across all Questly crates:
//! - ID types (TaskId, SubTaskId, BadgeId)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

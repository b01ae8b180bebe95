//! # Questly Mentor
//!
//! The mentor assistant ("Dr. Rudhh").
//!
//! The model provider sits behind [`MentorBackend`]. Every call the
//! [`Mentor`] makes is raced against a timeout and degrades to a canned
//! answer, so callers always get something usable back.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod backend;
pub mod error;
pub mod fallback;
pub mod mentor;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::backend::*;
    pub use crate::error::*;
    pub use crate::fallback::*;
    pub use crate::mentor::*;
}

pub use prelude::*;

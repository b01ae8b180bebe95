//! # Questly Store
//!
//! The whole Questly state is one JSON document kept under a storage key.
//! Reads back-fill anything older clients did not write; writes replace the
//! document atomically.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod document;
pub mod store;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::document::*;
    pub use crate::store::*;
}

pub use prelude::*;

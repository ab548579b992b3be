//! kb-core: shared types, IDs, errors, configuration, and network helpers.
//!
//! This crate is the foundational dependency for all other kb-* crates,
//! providing type-safe identifiers, a unified error type, application
//! configuration, and request/host resolution helpers.

pub mod config;
pub mod error;
pub mod ids;
pub mod network;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;

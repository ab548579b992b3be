//! kitbag - helpers for web backends.
//!
//! This library crate exposes the avatar service used by the CLI and the
//! integration tests. The building blocks live in the `kb-*` crates.

pub mod images;

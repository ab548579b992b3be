//! Database query modules.

pub mod tags;
pub mod users;

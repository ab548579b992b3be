//! Avatar management.
//!
//! This module ties image storage from `kb_images` to user records from
//! `kb_db`, applying the configured thumbnail ceiling to every upload.

mod service;

pub use service::{AvatarService, AVATAR_DIR};

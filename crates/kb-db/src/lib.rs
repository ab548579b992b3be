//! kb-db: database access and persistence layer.
//!
//! This crate provides SQLite-backed storage with connection pooling,
//! embedded migrations, typed models, query modules, many-to-many relation
//! reconciliation and save/delete lifecycle hooks.

pub mod lifecycle;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod relation;

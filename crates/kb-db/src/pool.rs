//! SQLite connection pooling.
//!
//! Every pool runs the embedded migrations before it is handed out, so a
//! caller never sees a connection to an unmigrated database.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use kb_core::config::DatabaseConfig;
use kb_core::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;

/// Open (creating if needed) the database file at `path`.
///
/// Missing parent directories are created. Connections run with foreign
/// keys enforced and WAL journaling.
pub fn init_pool(path: &Path) -> Result<DbPool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    tracing::debug!(path = %path.display(), "opening database");

    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;",
        )
    });
    build(manager)
}

/// Open the database named by the `database` config section.
pub fn open(config: &DatabaseConfig) -> Result<DbPool> {
    init_pool(&config.path)
}

/// A private in-memory database shared by the connections of one pool.
pub fn init_memory_pool() -> Result<DbPool> {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    let uri = format!(
        "file:kitbag_memdb_{}?mode=memory&cache=shared",
        NEXT.fetch_add(1, Ordering::Relaxed)
    );

    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    build(manager)
}

fn build(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {e}")))?;
    let conn = get_conn(&pool)?;
    migrations::run_migrations(&conn)?;
    drop(conn);
    Ok(pool)
}

pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {e}")))
}

//! User CRUD operations.
//!
//! Writes go through [`lifecycle::save`] and [`lifecycle::delete`] so the
//! model's validation and hooks always run.

use kb_core::{Error, Result, UserId};
use rusqlite::Connection;

use crate::lifecycle::{self, Persist};
use crate::models::{User, UserUpdate};

const COLS: &str = "id, first_name, last_name, avatar, created_at, updated_at";

impl Persist for User {
    fn write(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO users (id, first_name, last_name, avatar, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                 first_name = excluded.first_name,
                 last_name  = excluded.last_name,
                 avatar     = excluded.avatar,
                 updated_at = excluded.updated_at",
            rusqlite::params![
                self.id.to_string(),
                self.first_name,
                self.last_name,
                self.avatar,
                self.created_at,
                self.updated_at,
            ],
        )
        .map_err(|e| Error::database(e.to_string()))?;
        Ok(())
    }

    fn erase(&self, conn: &Connection) -> Result<bool> {
        let n = conn
            .execute("DELETE FROM users WHERE id = ?1", [self.id.to_string()])
            .map_err(|e| Error::database(e.to_string()))?;
        Ok(n > 0)
    }
}

/// Create and persist a new user.
pub fn create_user(conn: &Connection, first_name: &str, last_name: &str) -> Result<User> {
    let mut user = User::new(first_name, last_name);
    lifecycle::save(conn, &mut user)?;
    Ok(user)
}

/// Get a user by ID.
pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
    let q = format!("SELECT {COLS} FROM users WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], User::from_row);
    match result {
        Ok(u) => Ok(Some(u)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Apply a partial update and return the refreshed user.
pub fn update_user(conn: &Connection, id: UserId, update: &UserUpdate) -> Result<User> {
    let mut user = get_user(conn, id)?.ok_or_else(|| Error::not_found("user", id))?;

    if let Some(first_name) = &update.first_name {
        user.first_name = first_name.clone();
    }
    if let Some(last_name) = &update.last_name {
        user.last_name = last_name.clone();
    }
    if let Some(avatar) = &update.avatar {
        user.avatar = avatar.clone();
    }

    lifecycle::save(conn, &mut user)?;
    get_user(conn, id)?.ok_or_else(|| Error::not_found("user", id))
}

/// Delete a user by ID. Returns true if deleted.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<bool> {
    match get_user(conn, id)? {
        Some(mut user) => lifecycle::delete(conn, &mut user),
        None => Ok(false),
    }
}

/// List all users ordered by name.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let q = format!("SELECT {COLS} FROM users ORDER BY last_name, first_name");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], User::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

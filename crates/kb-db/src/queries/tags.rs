//! Tag operations and the user/tag membership table.

use std::collections::HashSet;

use chrono::Utc;
use kb_core::{Error, Result, TagId, UserId};
use rusqlite::Connection;

use crate::models::Tag;

const COLS: &str = "id, name, created_at";

/// Create a new tag. Names must be non-blank and unique.
pub fn create_tag(conn: &Connection, name: &str) -> Result<Tag> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("tag name cannot be blank".into()));
    }

    let id = TagId::new();
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![id.to_string(), name, &now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Tag {
        id,
        name: name.to_string(),
        created_at: now,
    })
}

/// Get a tag by ID.
pub fn get_tag(conn: &Connection, id: TagId) -> Result<Option<Tag>> {
    let q = format!("SELECT {COLS} FROM tags WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Tag::from_row) {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Get a tag by its unique name.
pub fn get_tag_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>> {
    let q = format!("SELECT {COLS} FROM tags WHERE name = ?1");
    match conn.query_row(&q, [name], Tag::from_row) {
        Ok(t) => Ok(Some(t)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all tags ordered by name.
pub fn list_tags(conn: &Connection) -> Result<Vec<Tag>> {
    let q = format!("SELECT {COLS} FROM tags ORDER BY name");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], Tag::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Delete a tag by ID. Memberships are removed by cascade.
pub fn delete_tag(conn: &Connection, id: TagId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM tags WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// List the tags attached to a user, ordered by name.
pub fn list_user_tags(conn: &Connection, user_id: UserId) -> Result<Vec<Tag>> {
    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.name, t.created_at FROM tags t
             JOIN user_tags ut ON ut.tag_id = t.id
             WHERE ut.user_id = ?1
             ORDER BY t.name",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([user_id.to_string()], Tag::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// IDs of the tags attached to a user.
pub fn user_tag_ids(conn: &Connection, user_id: UserId) -> Result<HashSet<TagId>> {
    let mut stmt = conn
        .prepare("SELECT tag_id FROM user_tags WHERE user_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let ids = stmt
        .query_map([user_id.to_string()], |row| crate::models::parse_id(row, 0))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<HashSet<TagId>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(ids)
}

/// Attach tags to a user. Already-attached tags are left alone; unknown
/// tags or users fail with a foreign-key error.
pub fn add_user_tags(conn: &Connection, user_id: UserId, tag_ids: &[TagId]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut stmt = conn
        .prepare(
            "INSERT OR IGNORE INTO user_tags (user_id, tag_id, created_at) VALUES (?1, ?2, ?3)",
        )
        .map_err(|e| Error::database(e.to_string()))?;
    for tag_id in tag_ids {
        stmt.execute(rusqlite::params![user_id.to_string(), tag_id.to_string(), &now])
            .map_err(|e| Error::database(e.to_string()))?;
    }
    Ok(())
}

/// Detach tags from a user. Returns the number of memberships removed.
pub fn remove_user_tags(conn: &Connection, user_id: UserId, tag_ids: &[TagId]) -> Result<usize> {
    let mut stmt = conn
        .prepare("DELETE FROM user_tags WHERE user_id = ?1 AND tag_id = ?2")
        .map_err(|e| Error::database(e.to_string()))?;
    let mut removed = 0;
    for tag_id in tag_ids {
        removed += stmt
            .execute([user_id.to_string(), tag_id.to_string()])
            .map_err(|e| Error::database(e.to_string()))?;
    }
    Ok(removed)
}

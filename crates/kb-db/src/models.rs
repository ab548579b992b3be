//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use kb_core::{TagId, UserId};
use uuid::Uuid;

/// Parse a UUID-based ID from a text column.
pub(crate) fn parse_id<T: From<Uuid>>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(T::from(uuid))
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Storage-relative path of the avatar image.
    pub avatar: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Build an unsaved user with a fresh ID.
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: UserId::new(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            avatar: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            first_name: row.get(1)?,
            last_name: row.get(2)?,
            avatar: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

/// Partial update of a [`User`]. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `Some(None)` clears the avatar.
    pub avatar: Option<Option<String>>,
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub created_at: String,
}

impl Tag {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }
}

impl crate::lifecycle::Lifecycle for User {
    /// Names are required and bounded like their form fields.
    fn clean(&self) -> kb_core::Result<()> {
        if self.first_name.trim().is_empty() {
            return Err(kb_core::Error::Validation("first_name: this field cannot be blank".into()));
        }
        for (field, value) in [("first_name", &self.first_name), ("last_name", &self.last_name)] {
            if value.chars().count() > MAX_NAME_LENGTH {
                return Err(kb_core::Error::Validation(format!(
                    "{field}: at most {MAX_NAME_LENGTH} characters"
                )));
            }
        }
        Ok(())
    }

    fn pre_save(&mut self) -> kb_core::Result<()> {
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }
}

/// Longest accepted first or last name.
pub const MAX_NAME_LENGTH: usize = 255;

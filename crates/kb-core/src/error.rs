//! Unified error type for kitbag.
//!
//! All crates funnel their failures into [`Error`]. Image and database
//! failures are mapped at the call site so the underlying library error
//! message is preserved verbatim.

use std::fmt;

/// Unified error type covering all failure modes in kitbag.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "user", "tag").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// An argument or model field failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Image data could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// No encoding format is known for the given extension or image.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A model failed validation while being saved.
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Turn a validation failure into an integrity failure, leaving every
    /// other error untouched.
    pub fn into_integrity(self) -> Self {
        match self {
            Error::Validation(msg) => Error::Integrity(msg),
            other => other,
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

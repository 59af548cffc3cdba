//! Error types for the bookmark store

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the bookmark store
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite database error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bookmark with this URL is already stored
    #[error("Bookmark already exists: url={url}")]
    AlreadyExists { url: String },

    /// The caller's cancellation token fired before the operation completed
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid search query
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),

    /// Schema migration failed; the store is not usable
    #[error("Schema migration failed: {0}")]
    Schema(String),

    /// Database corruption or unexpected state
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(#[from] tokio_rusqlite::Error),
}

impl Error {
    /// Create a database error with a message
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a schema migration error
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create an invalid query error
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create an already exists error
    pub fn already_exists(url: impl Into<String>) -> Self {
        Self::AlreadyExists { url: url.into() }
    }

    /// Duplicate insert, which callers treat as "bookmark already present"
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

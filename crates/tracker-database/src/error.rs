//! Storage error types.

use thiserror::Error;

/// Storage gateway error.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection error (open failed after retries)
    #[error("connection error: {0}")]
    Connection(String),

    /// JSON serialization error (affix list column)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Row contains a value the model cannot represent
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Result type alias using DatabaseError.
pub type DatabaseResult<T> = Result<T, DatabaseError>;

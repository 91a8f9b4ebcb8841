//! Error types for CSVDB operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.

use thiserror::Error;

/// Error type for all database operations.
///
/// SQL failures raised while running a user command are not surfaced
/// through this type: they are captured into the command output instead.
/// `DatabaseError` covers the infrastructure around it (sync, files, config).
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Embedded engine error (SQLite)
    #[error("{0}")]
    Engine(#[from] rusqlite::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// CSV could not be loaded as a table
    #[error("Ingest failed: {0}")]
    Ingest(String),

    /// Table could not be written back to CSV
    #[error("Export failed: {0}")]
    Export(String),

    /// Upload or lookup used a file name that cannot live in the data directory
    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatabaseError {
    /// Create an ingest error with context.
    ///
    /// # Arguments
    ///
    /// * `msg` - Error message
    pub fn ingest(msg: impl Into<String>) -> Self {
        Self::Ingest(msg.into())
    }

    /// Create an export error with context.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Create a configuration error with context.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Check if error was caused by a bad client-supplied name.
    ///
    /// # Returns
    ///
    /// `true` when the caller should answer with a client error instead of a server error
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFileName(_))
    }

    /// Engine message as SQLite reports it.
    ///
    /// Prepare failures carry the statement text and offset; only the
    /// message itself is kept (`near "X": syntax error`).
    pub fn engine_message(&self) -> String {
        match self {
            Self::Engine(rusqlite::Error::SqlInputError { msg, .. }) => msg.clone(),
            other => other.to_string(),
        }
    }
}

//! Error types for the SQL batch runner.

use crate::models::config::Engine;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SQL batch runner.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("{}", .0.join("\n"))]
    InvalidConfig(Vec<String>),

    // Script errors
    #[error("failed to read SQL file: {0}")]
    ScriptRead(#[source] std::io::Error),

    #[error("SQL file not found: {0}")]
    PathNotFound(String),

    #[error("no SQL statements found in file")]
    NoStatements,

    // Execution errors
    #[error("{0} support is not enabled in this build")]
    EngineUnavailable(Engine),

    #[error("failed to connect: {0}")]
    Connect(String),

    #[error("{0}")]
    Database(String),

    #[error("statement {index} failed: {message}")]
    Statement { index: usize, message: String },

    #[error("failed to commit transaction: {0}")]
    Commit(String),

    #[error("batch did not finish within {0} seconds")]
    Timeout(u64),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a driver error.
    pub fn database<E: std::fmt::Display>(err: E) -> Self {
        Error::Database(err.to_string())
    }

    /// Errors detected before any connection attempt.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// Errors raised while talking to the database.
    pub fn is_execution(&self) -> bool {
        matches!(
            self,
            Error::EngineUnavailable(_)
                | Error::Connect(_)
                | Error::Database(_)
                | Error::Statement { .. }
                | Error::Commit(_)
                | Error::Timeout(_)
        )
    }
}

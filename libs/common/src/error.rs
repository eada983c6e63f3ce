//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! persistence and storage collaborators.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A uniqueness constraint rejected the write
    #[error("{0}")]
    Conflict(String),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify a query failure, turning unique violations into
    /// [`DatabaseError::Conflict`] with the given message.
    pub fn from_query(error: SqlxError, conflict_message: &str) -> Self {
        match error.as_database_error() {
            Some(db_error) if db_error.is_unique_violation() => {
                DatabaseError::Conflict(conflict_message.to_string())
            }
            _ => DatabaseError::Query(error),
        }
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for the image storage backends
#[derive(Error, Debug)]
pub enum StorageError {
    /// Local filesystem failure
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote object store failure
    #[error("Object store error: {0}")]
    Remote(String),

    /// Configuration error
    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;

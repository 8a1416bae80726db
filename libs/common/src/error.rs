//! Custom error types for the common library
//!
//! This module defines the storage error type shared by every service.

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
    Query(#[from] SqlxError),

    /// A stored value could not be mapped onto its domain type
    #[error("Database decode error: {0}")]
    Decode(String),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Build a decode error for a column holding an unexpected value
    pub fn decode(column: &str, value: impl std::fmt::Display) -> Self {
        DatabaseError::Decode(format!("unexpected value '{}' in column {}", value, column))
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

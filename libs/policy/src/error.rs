//! Errors raised by the policy engine

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

/// Rule violations detected by the policy engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolicyError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// The actor's role does not allow the operation
    #[error("{0}")]
    Forbidden(String),

    /// A record the operation depends on does not exist
    #[error("{0}")]
    NotFound(String),

    /// The employee already has a session for the date
    #[error("Employee {user_id} already checked in on {date}")]
    DuplicateSession { user_id: Uuid, date: NaiveDate },

    /// A company rule is missing or cannot be parsed
    #[error("Invalid company rule: {0}")]
    Configuration(String),

    /// Unknown report window
    #[error("Invalid range '{0}', expected one of week, month, year")]
    InvalidRange(String),
}

impl PolicyError {
    pub fn validation(message: impl Into<String>) -> Self {
        PolicyError::Validation(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        PolicyError::Forbidden(message.into())
    }
}

/// Type alias for Result with PolicyError
pub type PolicyResult<T> = Result<T, PolicyError>;

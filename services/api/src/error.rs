//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use policy::PolicyError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid access token
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    DuplicateSession(String),

    /// Company rules are missing or broken; details stay in the logs
    #[error("Company rules are not configured correctly")]
    Configuration(String),

    #[error("{0}")]
    InvalidRange(String),

    /// The ledger could not be notified
    #[error("Ledger notification failed: {0}")]
    ExternalNotification(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),
}

impl From<PolicyError> for ApiError {
    fn from(err: PolicyError) -> Self {
        let message = err.to_string();
        match err {
            PolicyError::Validation(_) => ApiError::Validation(message),
            PolicyError::Forbidden(_) => ApiError::Forbidden(message),
            PolicyError::NotFound(_) => ApiError::NotFound(message),
            PolicyError::DuplicateSession { .. } => ApiError::DuplicateSession(message),
            PolicyError::Configuration(_) => ApiError::Configuration(message),
            PolicyError::InvalidRange(_) => ApiError::InvalidRange(message),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Storage(DatabaseError::Query(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) | ApiError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::DuplicateSession(_) => StatusCode::CONFLICT,
            ApiError::ExternalNotification(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(err) if is_unique_violation(err) => StatusCode::BAD_REQUEST,
            ApiError::Configuration(_) | ApiError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

fn is_unique_violation(err: &DatabaseError) -> bool {
    match err {
        DatabaseError::Query(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Configuration(details) => {
                error!("Configuration error: {}", details);
                self.to_string()
            }
            ApiError::Storage(err) if is_unique_violation(err) => {
                "A record with the same unique value already exists".to_string()
            }
            ApiError::Storage(err) => {
                error!("Storage error: {}", err);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

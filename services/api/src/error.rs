//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::{DatabaseError, StorageError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Credentials did not match a user
    #[error("{0}")]
    Authentication(String),

    /// Missing or invalid bearer token
    #[error("Unauthorized")]
    Unauthorized,

    /// The entity does not exist or belongs to someone else
    #[error("Not found.")]
    NotFound,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Image storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Validation(msg) | ApiError::Authentication(msg) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not found.".to_string()),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(DatabaseError::Conflict(msg)) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Database(e) => {
                error!("Database failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            ApiError::Storage(e) => {
                error!("Storage failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Storage error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (ApiError::Authentication("no".into()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
            (ApiError::NotFound, StatusCode::NOT_FOUND),
            (
                ApiError::Database(DatabaseError::Conflict("taken".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::Database(DatabaseError::Migration("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::Storage(StorageError::Remote("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}

//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StoreError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or unusable bearer token
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in, but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Authentication flow error (carries its own code)
    #[error("{0}")]
    Auth(#[from] AuthError),

    /// Document store error
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Auth(e) => {
                let status = match e {
                    AuthError::InvalidEmail
                    | AuthError::WeakPassword
                    | AuthError::PasswordMismatch
                    | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
                    AuthError::UserNotFound
                    | AuthError::WrongPassword
                    | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
                    AuthError::AccessDenied => StatusCode::FORBIDDEN,
                    AuthError::EmailInUse => StatusCode::CONFLICT,
                    AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
                    AuthError::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
                    AuthError::Hash(_) | AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.code())
            }
            ApiError::Storage(StoreError::NotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(StoreError::Duplicate { .. }) => (StatusCode::CONFLICT, "DUPLICATE"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_keep_their_codes() {
        let (status, code) = ApiError::from(AuthError::AccessDenied).status_and_code();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "access-denied");

        let (status, code) = ApiError::from(AuthError::TooManyRequests).status_and_code();
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(code, "too-many-requests");
    }

    #[test]
    fn test_store_not_found_is_404() {
        let err = ApiError::from(StoreError::not_found("services", "x"));
        assert_eq!(err.status_and_code().0, StatusCode::NOT_FOUND);

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

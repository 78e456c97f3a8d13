//! API error handling.
//!
//! Every error leaves the server as `{code, message}` JSON.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::error::Error;

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Create a 401 Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => ApiError::bad_request(msg),
            _ => {
                tracing::error!(error = %err, "Unexpected error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid credentials"),
            AuthError::NoActiveSession => ApiError::unauthorized("No active session"),
            AuthError::Storage(e) => e.into(),
            AuthError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal authentication error");
                ApiError::internal("Internal server error")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::not_found("Resource not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "Resource not found");
    }

    #[test]
    fn test_auth_errors_map_to_unauthorized() {
        let api_err: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(api_err.status, StatusCode::UNAUTHORIZED);

        let api_err: ApiError = AuthError::NoActiveSession.into();
        assert_eq!(api_err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let storage = Error::io_path(
            "writing snapshot",
            std::path::Path::new("/srv/data/sessions.json"),
            std::io::Error::other("disk full"),
        );
        let api_err: ApiError = AuthError::Storage(storage).into();

        assert_eq!(api_err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_err.message, "Internal server error");
        assert!(!api_err.message.contains("sessions.json"));
    }

    #[test]
    fn test_validation_error_is_bad_request() {
        let api_err: ApiError = Error::validation("Email and password are required").into();
        assert_eq!(api_err.status, StatusCode::BAD_REQUEST);
        assert_eq!(api_err.code, "BAD_REQUEST");
    }
}

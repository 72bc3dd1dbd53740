// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::StoreError;
use crate::uploads::UploadError;

/// Client-facing text for failures whose detail must stay server-side
pub const GENERIC_FAILURE: &str = "An error occurred while processing your request";

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 401 Unauthorized
    #[error("{0}")]
    Unauthenticated(String),

    // 405 Method Not Allowed
    #[error("Method not allowed")]
    MethodNotAllowed,

    // 403 Forbidden
    #[error("Invalid CSRF token")]
    InvalidCsrf,
    #[error("{0}")]
    Unauthorized(String),

    // 400 Bad Request
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    UploadRejected(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 413 Payload Too Large
    #[error("Request body too large")]
    PayloadTooLarge,

    // 500 Internal Server Error
    #[error("{0}")]
    Storage(String),
    /// Displays the detail; clients only ever see the generic text
    #[error("{0}")]
    Unexpected(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthenticated(_) => 401,
            ApiError::MethodNotAllowed => 405,
            ApiError::InvalidCsrf => 403,
            ApiError::Unauthorized(_) => 403,
            ApiError::Validation(_) => 400,
            // Duplicate email is reported as a plain validation failure
            ApiError::Conflict(_) => 400,
            ApiError::UploadRejected(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::PayloadTooLarge => 413,
            ApiError::Storage(_) => 500,
            ApiError::Unexpected(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::Unauthenticated(msg) => msg,
            ApiError::MethodNotAllowed => "Method not allowed",
            ApiError::InvalidCsrf => "Invalid CSRF token",
            ApiError::Unauthorized(msg) => msg,
            ApiError::Validation(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::UploadRejected(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::PayloadTooLarge => "Request body too large",
            ApiError::Storage(msg) => msg,
            ApiError::Unexpected(_) => GENERIC_FAILURE,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn upload_rejected(message: impl Into<String>) -> Self {
        ApiError::UploadRejected(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        ApiError::Unexpected(detail.into())
    }

    /// Log the underlying failure and keep only `client_message` for the response
    pub fn storage(err: impl std::fmt::Display, client_message: impl Into<String>) -> Self {
        let client_message = client_message.into();
        tracing::error!(error = %err, "{}", client_message);
        ApiError::Storage(client_message)
    }
}

// Storage errors that reach the boundary without handler context
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::storage(err, GENERIC_FAILURE)
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        if err.is_storage_failure() {
            ApiError::storage(err, "Failed to save uploaded file")
        } else {
            ApiError::upload_rejected(err.to_string())
        }
    }
}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if let ApiError::Unexpected(detail) = &self {
            tracing::error!("Unexpected error: {}", detail);
        }
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_is_reported_as_bad_request() {
        let err = ApiError::conflict("Email already in use");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_json(), json!({"success": false, "error": "Email already in use"}));
    }

    #[test]
    fn unexpected_errors_hide_their_detail() {
        let err = ApiError::unexpected("bcrypt worker panicked");
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), GENERIC_FAILURE);
        assert_eq!(err.to_string(), "bcrypt worker panicked");
    }

    #[test]
    fn oversized_bodies_get_the_standard_envelope() {
        let err = ApiError::PayloadTooLarge;
        assert_eq!(err.status_code(), 413);
        assert_eq!(err.to_json(), json!({"success": false, "error": "Request body too large"}));
    }

    #[test]
    fn store_errors_become_generic_storage_failures() {
        let err: ApiError = StoreError::Backend("connection reset by peer".to_string()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), GENERIC_FAILURE);
    }

    #[test]
    fn upload_rejections_keep_their_message() {
        let err: ApiError = UploadError::TooLarge { max_bytes: 5 * 1024 * 1024 }.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "File too large. Maximum size is 5MB");
    }
}

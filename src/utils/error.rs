//! Error handling module
//!
//! Defines error types and handling logic used in the project

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Request validation failed
    #[error("Request validation failed: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Payload too large
    #[error("Payload too large")]
    PayloadTooLarge,

    /// Service temporarily unavailable
    #[error("Service temporarily unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl AppError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Serialization(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config_error",
            AppError::HttpClient(_) => "api_error",
            AppError::Serialization(_) => "serialization_error",
            AppError::Validation(_) => "invalid_request_error",
            AppError::NotFound(_) => "not_found_error",
            AppError::PayloadTooLarge => "invalid_request_error",
            AppError::ServiceUnavailable(_) => "overloaded_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Whether detailed error information should be logged
    pub fn should_log_details(&self) -> bool {
        matches!(
            self,
            AppError::Config(_) | AppError::HttpClient(_) | AppError::Internal(_)
        )
    }

    /// Convert to the wire error format
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                error_type: self.error_type().to_string(),
                message: self.to_string(),
            },
        }
    }
}

/// Implement IntoResponse trait to allow errors to be returned directly as HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log error
        if self.should_log_details() {
            tracing::error!("Application error: {} - Status code: {}", self, status);
        } else {
            tracing::warn!("Client error: {} - Status code: {}", self.error_type(), status);
        }

        (status, Json(self.to_body())).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Error handling helper functions
#[allow(dead_code)]
pub mod helpers {
    use super::*;

    /// Create validation error
    pub fn validation_error(message: impl Into<String>) -> AppError {
        AppError::Validation(message.into())
    }

    /// Create not found error
    pub fn not_found_error(message: impl Into<String>) -> AppError {
        AppError::NotFound(message.into())
    }

    /// Create internal error
    pub fn internal_error(message: impl Into<String>) -> AppError {
        AppError::Internal(message.into())
    }

    /// Create service unavailable error
    pub fn service_unavailable_error(message: impl Into<String>) -> AppError {
        AppError::ServiceUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::Validation("test".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(AppError::PayloadTooLarge.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            AppError::ServiceUnavailable("test".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Internal("test".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            AppError::Validation("test".to_string()).error_type(),
            "invalid_request_error"
        );
        assert_eq!(AppError::NotFound("test".to_string()).error_type(), "not_found_error");
        assert_eq!(AppError::Internal("test".to_string()).error_type(), "internal_error");
    }

    #[test]
    fn test_wire_body_shape() {
        let body = AppError::Validation("message cannot be empty".to_string()).to_body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert_eq!(
            json["error"]["message"],
            "Request validation failed: message cannot be empty"
        );
    }

    #[test]
    fn test_from_serde_error() {
        let parse_error = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let app_error: AppError = parse_error.into();
        assert!(matches!(app_error, AppError::Serialization(_)));
    }

    #[test]
    fn test_helpers() {
        let validation_err = helpers::validation_error("Missing field");
        assert!(matches!(validation_err, AppError::Validation(_)));

        let unavailable_err = helpers::service_unavailable_error("No providers");
        assert!(matches!(unavailable_err, AppError::ServiceUnavailable(_)));
    }

    #[test]
    fn test_should_log_details() {
        assert!(AppError::Internal("boom".to_string()).should_log_details());
        assert!(!AppError::Validation("bad".to_string()).should_log_details());
    }
}

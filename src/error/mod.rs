//! Centralized API error handling
//!
//! Single error type for the HTTP surface with status code mapping and a
//! uniform JSON body: `{"error": {"code", "message"}}`. Auth failures keep
//! their specific machine-readable code; messages stay generic and never
//! carry stored state.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::auth::AuthError;

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

/// JSON error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in the response
#[derive(Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl ApiError {
    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Auth(e) => e.kind(),
            ApiError::MissingToken => "MISSING_TOKEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::TooManyRequests => "TOO_MANY_REQUESTS",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Auth(e) => match e {
                AuthError::MalformedInput(_) | AuthError::UnknownPublicKeyEncoding => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::UNAUTHORIZED,
            },
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Server errors keep their detail in the log and out of the body.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code = %error_code, "Server error occurred");
            "Internal server error".to_string()
        } else {
            match status {
                StatusCode::UNAUTHORIZED | StatusCode::TOO_MANY_REQUESTS => {
                    tracing::warn!(error = %self, code = %error_code, "Request rejected");
                }
                _ => {
                    tracing::debug!(error = %self, code = %error_code, "Client error occurred");
                }
            }
            self.to_string()
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: error_code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

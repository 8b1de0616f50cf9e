//! Error types and handling
//!
//! All handler errors are converted to a consistent JSON response format.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::services::ServiceError;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input or state (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request fields failed validation (400)
    #[error("Validation error: {0}")]
    Validation(validator::ValidationErrors),

    /// Unauthorized - unknown or missing identity (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden - insufficient rights (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (error_type, should_log) = match &self {
            AppError::NotFound(_) => ("not_found", false),
            AppError::BadRequest(_) => ("bad_request", false),
            AppError::Validation(_) => ("validation_error", false),
            AppError::Unauthorized(_) => ("unauthorized", false),
            AppError::Forbidden(_) => ("forbidden", false),
            AppError::Internal(_) => ("internal_error", true),
        };

        if should_log {
            error!(error = %self, error_type = error_type, "Request error");
        }

        let body = match &self {
            AppError::Validation(errors) => {
                let response = ErrorResponse::new(error_type, "Request validation failed");
                match serde_json::to_value(errors) {
                    Ok(details) => response.with_details(details),
                    Err(_) => response,
                }
            }
            // Internal details stay in the log
            AppError::Internal(_) => ErrorResponse::new(error_type, "Internal server error"),
            _ => ErrorResponse::new(error_type, self.to_string()),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserNotFound => {
                AppError::unauthorized("User does not exist or is invalid")
            }
            ServiceError::Forbidden => AppError::forbidden(err.to_string()),
            ServiceError::OrganizationNotFound
            | ServiceError::TenderNotFound
            | ServiceError::BidNotFound
            | ServiceError::VersionNotFound(_) => AppError::not_found(err.to_string()),
            ServiceError::InvalidTransition(_) | ServiceError::DecisionSubmit(_) => {
                AppError::bad_request(err.to_string())
            }
            ServiceError::Validation(errors) => AppError::Validation(errors),
            ServiceError::Storage(e) => AppError::internal(format!("{e:#}")),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(format!("{err:#}"))
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

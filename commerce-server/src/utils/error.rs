//! Unified Error Handling
//!
//! Application-wide error type and JSON error responses. Every handler
//! returns [`AppResult`] and lets [`AppError`] map itself onto an HTTP
//! status and body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Result type used across handlers and components
pub type AppResult<T> = Result<T, AppError>;

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication / Authorization ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Caller Errors ==========
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Cart is empty")]
    EmptyCart,

    // ========== Conflicts (no side effect, retry after resolving) ==========
    #[error("Insufficient stock for variant {variant_id}")]
    InsufficientStock { variant_id: String },

    #[error("Illegal order status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Payment already recorded")]
    DuplicatePayment,

    #[error("Conflict: {0}")]
    Conflict(String),

    // ========== Payment Verification ==========
    /// Security relevant. The expected signature is never part of the
    /// message, only that verification failed.
    #[error("Invalid payment signature")]
    InvalidSignature,

    #[error("Payment not captured")]
    PaymentNotCaptured,

    // ========== External Collaborators ==========
    /// Gateway timeout or unavailability. Retryable with backoff,
    /// never treated as success.
    #[error("External service error: {0}")]
    ExternalService(String),

    // ========== System Errors ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body for error responses
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation_failed",
            AppError::NotFound(_) => "not_found",
            AppError::EmptyCart => "empty_cart",
            AppError::InsufficientStock { .. } => "insufficient_stock",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::DuplicatePayment => "duplicate_payment",
            AppError::Conflict(_) => "conflict",
            AppError::InvalidSignature => "invalid_signature",
            AppError::PaymentNotCaptured => "payment_not_captured",
            AppError::ExternalService(_) => "external_service_error",
            AppError::Database(_) => "database_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_)
            | AppError::EmptyCart
            | AppError::InsufficientStock { .. }
            | AppError::InvalidTransition { .. }
            | AppError::InvalidSignature
            | AppError::PaymentNotCaptured => StatusCode::BAD_REQUEST,
            AppError::DuplicatePayment | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // ==================== Convenience constructors ====================

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        AppError::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Server-side details stay in the logs, not the response
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                "Database error".to_string()
            }
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                "Internal server error".to_string()
            }
            AppError::ExternalService(msg) => {
                error!(target: "gateway", error = %msg, "Payment gateway error");
                "Payment gateway unavailable, retry later".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(ErrorBody {
            code: self.code(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::not_found("record"),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

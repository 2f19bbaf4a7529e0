//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use domain_ledger::LedgerError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("Daily debit cap exceeded: {0}")]
    DailyCapExceeded(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_)
            | ApiError::InsufficientFunds(_)
            | ApiError::DailyCapExceeded(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::InsufficientFunds(_) => "insufficient_funds",
            ApiError::DailyCapExceeded(_) => "daily_cap_exceeded",
            ApiError::Unavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    /// The caller-facing 404 for accounts the caller may not see
    pub fn account_not_found() -> Self {
        ApiError::NotFound("Account not found".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            // storage details stay in the logs
            ApiError::Internal(detail) => {
                warn!(detail = %detail, "Internal error");
                "Internal server error".to_string()
            }
            ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Forbidden(msg)
            | ApiError::Conflict(msg)
            | ApiError::Validation(msg)
            | ApiError::InsufficientFunds(msg)
            | ApiError::DailyCapExceeded(msg)
            | ApiError::Unavailable(msg) => msg.clone(),
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            message,
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound(_) => ApiError::account_not_found(),
            LedgerError::InvalidAmount(_) | LedgerError::InvalidRange(_) => {
                ApiError::Validation(message)
            }
            LedgerError::InsufficientFunds { .. } => ApiError::InsufficientFunds(message),
            LedgerError::DailyCapExceeded { .. } => ApiError::DailyCapExceeded(message),
            LedgerError::BalanceNotZero(_)
            | LedgerError::InvalidStateTransition { .. }
            | LedgerError::Conflict(_) => ApiError::Conflict(message),
            LedgerError::Transient(_) => ApiError::Unavailable(message),
            LedgerError::Internal(_) => ApiError::Internal(message),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

//! API error handling
//!
//! Maps domain errors onto HTTP statuses. All error responses share the
//! `{ "success": false, "error": ... }` envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_claims::ClaimError;
use domain_quotation::QuoteError;
use domain_subscription::ContractError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<QuoteError> for ApiError {
    fn from(e: QuoteError) -> Self {
        match e {
            QuoteError::Validation(_) | QuoteError::Expired(_) => {
                ApiError::BadRequest(e.to_string())
            }
            QuoteError::NotFound(_) => ApiError::NotFound(e.to_string()),
            QuoteError::NotConvertible { .. } => ApiError::Conflict(e.to_string()),
            QuoteError::Database(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ContractError> for ApiError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ContractError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ContractError::DuplicateContract(_)
            | ContractError::NotActive { .. }
            | ContractError::AlreadyTerminated(_) => ApiError::Conflict(e.to_string()),
            ContractError::Database(_) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(e: ClaimError) -> Self {
        match e {
            ClaimError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ClaimError::NotFound(_) => ApiError::NotFound(e.to_string()),
            ClaimError::InvalidState { .. } | ClaimError::AlreadyClosed(_) => {
                ApiError::Conflict(e.to_string())
            }
            ClaimError::Database(_) => ApiError::Internal(e.to_string()),
        }
    }
}

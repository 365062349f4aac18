//! Claims domain errors

use thiserror::Error;

use infra_db::DatabaseError;

/// Errors produced by the claim lifecycle
#[derive(Debug, Error)]
pub enum ClaimError {
    /// Bad input
    #[error("Validation error: {0}")]
    Validation(String),

    /// No claim with this id
    #[error("Claim not found: {0}")]
    NotFound(String),

    /// The operation expects the claim in a different status
    #[error("Claim {id} is in status {status}, expected {expected}")]
    InvalidState {
        id: String,
        status: String,
        expected: String,
    },

    /// INDEMNIFIED and REJECTED are absorbing
    #[error("Claim {0} is already closed")]
    AlreadyClosed(String),

    /// Storage failure; the operation was aborted
    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),
}

impl ClaimError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClaimError::Validation(message.into())
    }

    pub fn invalid_state(
        id: impl Into<String>,
        status: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        ClaimError::InvalidState {
            id: id.into(),
            status: status.into(),
            expected: expected.into(),
        }
    }
}

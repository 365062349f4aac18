//! Quotation domain errors

use thiserror::Error;

use infra_db::DatabaseError;

/// Errors produced by the quote lifecycle
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Bad input (non-positive value, unknown asset type, blank client)
    #[error("Validation error: {0}")]
    Validation(String),

    /// No quote with this id
    #[error("Quote not found: {0}")]
    NotFound(String),

    /// The quote's expiration horizon has passed; it can no longer convert
    #[error("Quote {0} has expired")]
    Expired(String),

    /// Operation is invalid for the quote's current status
    #[error("Quote {id} is not convertible (status {status})")]
    NotConvertible { id: String, status: String },

    /// Storage failure; the operation was aborted
    #[error("Storage error: {0}")]
    Database(#[from] DatabaseError),
}

impl QuoteError {
    pub fn validation(message: impl Into<String>) -> Self {
        QuoteError::Validation(message.into())
    }
}

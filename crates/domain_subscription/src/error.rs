//! Subscription domain errors

use thiserror::Error;

use infra_db::DatabaseError;

/// Errors produced by the contract lifecycle
#[derive(Debug, Error)]
pub enum ContractError {
    /// Bad input
    #[error("Validation error: {0}")]
    Validation(String),

    /// No contract with this id
    #[error("Contract not found: {0}")]
    NotFound(String),

    /// A contract already exists for this quote; at most one is allowed
    #[error("A contract already exists for quote {0}")]
    DuplicateContract(String),

    /// Operation requires an ACTIVE contract
    #[error("Contract {id} is not active (status {status})")]
    NotActive { id: String, status: String },

    /// TERMINATED is absorbing
    #[error("Contract {0} is already terminated")]
    AlreadyTerminated(String),

    /// Storage failure; the operation was aborted
    #[error("Storage error: {0}")]
    Database(DatabaseError),
}

impl ContractError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContractError::Validation(message.into())
    }
}

/// Unique violations on `quote_id` become `DuplicateContract`, so the
/// race between two concurrent issuance attempts surfaces as the same
/// domain error as the explicit pre-check.
impl From<DatabaseError> for ContractError {
    fn from(e: DatabaseError) -> Self {
        match e {
            DatabaseError::DuplicateEntry(msg) => ContractError::DuplicateContract(msg),
            other => ContractError::Database(other),
        }
    }
}

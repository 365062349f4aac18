//! Claims bounded context
//!
//! Owns the claim lifecycle: declaration against a contract, assessment of
//! the payable amount, and the payout itself. A background sweep advances
//! idle claims automatically so the demo keeps moving without operator
//! input.

pub mod claim;
pub mod error;
pub mod service;

pub use claim::{Claim, ClaimStatus, ClaimType};
pub use error::ClaimError;
pub use service::{
    ClaimStats, ClaimsConfig, ClaimsService, ContractIssuedHandler, ContractTerminatedHandler,
};

//! Subscription bounded context
//!
//! Owns the contract lifecycle. Contracts are issued from quotes, either
//! manually through the API or automatically when a "quote generated"
//! notification arrives (a randomized demo decision, not business policy),
//! then amended or terminated. TERMINATED is absorbing.

pub mod contract;
pub mod error;
pub mod service;

pub use contract::{Contract, ContractStatus, TerminationReason};
pub use error::ContractError;
pub use service::{ContractStats, QuoteGeneratedHandler, SubscriptionConfig, SubscriptionService};

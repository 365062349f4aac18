//! Core Kernel - Foundational types for the event-driven insurance lab
//!
//! This crate provides the strongly-typed identifiers shared by the three
//! bounded contexts (Quotation, Subscription, Claims) and their event
//! notifications.

pub mod identifiers;

pub use identifiers::{ClaimId, ContractId, EventId, QuoteId};

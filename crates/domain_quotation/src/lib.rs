//! Quotation bounded context
//!
//! Owns the quote lifecycle: rating a new quote, converting it into the
//! input of a contract, and expiring stale quotes via a background sweep.
//! Status transitions are monotonic; no state is re-enterable.

pub mod error;
pub mod quote;
pub mod service;

pub use error::QuoteError;
pub use quote::{premium_for, AssetType, Quote, QuoteStatus};
pub use service::{QuotationConfig, QuotationService, QuoteStats};

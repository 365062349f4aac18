//! Infrastructure Database Layer
//!
//! This crate provides the storage infrastructure for the event-driven
//! insurance lab. Each service owns a local SQLite database accessed through
//! SQLx; the crate follows the repository pattern so the domain layer never
//! sees SQL.
//!
//! Status columns are guarded by CHECK constraints and monetary amounts are
//! stored as TEXT and parsed into `rust_decimal::Decimal` at the repository
//! boundary, keeping arithmetic exact.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{DatabaseConfig, create_pool, init_schema};
//!
//! let pool = create_pool(DatabaseConfig::new("sqlite://data/quotation.db")).await?;
//! init_schema(&pool).await?;
//! let repo = QuoteRepository::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;
pub mod schema;

pub use error::DatabaseError;
pub use pool::{create_memory_pool, create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::claims::{ClaimRepository, ClaimRow, NewClaim};
pub use repositories::contracts::{ContractRepository, ContractRow, NewContract};
pub use repositories::event_log::{EventLogRepository, EventLogRow};
pub use repositories::quotes::{NewQuote, QuoteRepository, QuoteRow};
pub use schema::init_schema;

//! Shared test fixtures and helpers for the insurance lab test suite.
//!
//! # Modules
//!
//! - `builders`: Builder patterns for row-level test data
//! - `database`: In-memory database setup
//! - `events`: Event capture helpers over the in-memory bus

pub mod builders;
pub mod database;
pub mod events;

pub use builders::*;
pub use database::*;
pub use events::*;

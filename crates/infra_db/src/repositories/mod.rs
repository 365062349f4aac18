//! Repository implementations
//!
//! One repository per owned entity, plus the audit log of published events.
//! Repositories speak in row types (strings for enums, `Decimal` for
//! amounts); the domain layer converts rows into typed entities.

pub mod claims;
pub mod contracts;
pub mod event_log;
pub mod quotes;

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::DatabaseError;

/// Parses a TEXT amount column into a `Decimal`.
pub(crate) fn parse_amount(column: &str, raw: &str) -> Result<Decimal, DatabaseError> {
    Decimal::from_str(raw)
        .map_err(|e| DatabaseError::CorruptRow(format!("{}: '{}' ({})", column, raw, e)))
}

/// Parses an optional TEXT amount column.
pub(crate) fn parse_opt_amount(
    column: &str,
    raw: Option<String>,
) -> Result<Option<Decimal>, DatabaseError> {
    raw.map(|s| parse_amount(column, &s)).transpose()
}

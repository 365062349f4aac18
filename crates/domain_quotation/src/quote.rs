//! Quote entity and premium rating

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::QuoteId;
use infra_db::{NewQuote, QuoteRow};

use crate::error::QuoteError;

/// Quotes stay convertible for 30 days.
pub const EXPIRATION_DAYS: i64 = 30;

/// Type of insured asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Auto,
    Home,
    Other,
}

impl AssetType {
    /// Flat annual premium rate for this asset type.
    pub fn rate(&self) -> Decimal {
        match self {
            AssetType::Auto => dec!(0.02),
            AssetType::Home => dec!(0.015),
            AssetType::Other => dec!(0.025),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetType::Auto => "AUTO",
            AssetType::Home => "HOME",
            AssetType::Other => "OTHER",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO" => Ok(AssetType::Auto),
            "HOME" => Ok(AssetType::Home),
            "OTHER" => Ok(AssetType::Other),
            other => Err(QuoteError::validation(format!(
                "unknown asset type '{}' (expected AUTO, HOME or OTHER)",
                other
            ))),
        }
    }
}

/// Quote status; transitions are monotonic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Generated,
    Converted,
    Expired,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Generated => "GENERATED",
            QuoteStatus::Converted => "CONVERTED",
            QuoteStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENERATED" => Ok(QuoteStatus::Generated),
            "CONVERTED" => Ok(QuoteStatus::Converted),
            "EXPIRED" => Ok(QuoteStatus::Expired),
            other => Err(QuoteError::validation(format!(
                "unknown quote status '{}'",
                other
            ))),
        }
    }
}

/// Computes the premium from the flat per-type rate table.
///
/// Deterministic: the same (asset type, value) pair always rates the same.
pub fn premium_for(asset_type: AssetType, value: Decimal) -> Decimal {
    value * asset_type.rate()
}

/// A priced insurance offer with an expiration window
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: QuoteId,
    pub client_id: String,
    pub asset_type: AssetType,
    pub asset_value: Decimal,
    pub premium: Decimal,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: QuoteStatus,
}

impl Quote {
    /// Rates and creates a new GENERATED quote with the 30-day horizon.
    pub fn new(
        client_id: impl Into<String>,
        asset_type: AssetType,
        asset_value: Decimal,
    ) -> Result<Self, QuoteError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(QuoteError::validation("client id must not be empty"));
        }
        if asset_value <= Decimal::ZERO {
            return Err(QuoteError::validation("asset value must be positive"));
        }

        let now = Utc::now();
        Ok(Self {
            id: QuoteId::new(),
            client_id,
            asset_type,
            asset_value,
            premium: premium_for(asset_type, asset_value),
            created_at: now,
            expires_at: now + Duration::days(EXPIRATION_DAYS),
            status: QuoteStatus::Generated,
        })
    }

    /// True when the expiration horizon has passed.
    ///
    /// Deliberately independent of the stored status: a quote past its
    /// horizon is not convertible even if the sweep has not flipped it yet.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub(crate) fn as_new_row(&self) -> NewQuote {
        NewQuote {
            id: self.id.to_string(),
            client_id: self.client_id.clone(),
            asset_type: self.asset_type.as_str().to_string(),
            asset_value: self.asset_value,
            premium: self.premium,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

impl TryFrom<QuoteRow> for Quote {
    type Error = QuoteError;

    fn try_from(row: QuoteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row
                .id
                .parse()
                .map_err(|e| QuoteError::validation(format!("bad quote id '{}': {}", row.id, e)))?,
            client_id: row.client_id,
            asset_type: row.asset_type.parse()?,
            asset_value: row.asset_value,
            premium: row.premium,
            created_at: row.created_at,
            expires_at: row.expires_at,
            status: row.status.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_premium_rate_table() {
        assert_eq!(premium_for(AssetType::Auto, dec!(25000)), dec!(500));
        assert_eq!(premium_for(AssetType::Home, dec!(200000)), dec!(3000));
        assert_eq!(premium_for(AssetType::Other, dec!(1000)), dec!(25));
    }

    #[test]
    fn test_new_quote_starts_generated() {
        let quote = Quote::new("CLIENT-1", AssetType::Auto, dec!(25000)).unwrap();
        assert_eq!(quote.status, QuoteStatus::Generated);
        assert_eq!(quote.premium, dec!(500));
        assert_eq!(quote.expires_at - quote.created_at, Duration::days(30));
    }

    #[test]
    fn test_new_quote_rejects_non_positive_value() {
        assert!(Quote::new("CLIENT-1", AssetType::Auto, dec!(0)).is_err());
        assert!(Quote::new("CLIENT-1", AssetType::Auto, dec!(-10)).is_err());
    }

    #[test]
    fn test_new_quote_rejects_blank_client() {
        assert!(Quote::new("  ", AssetType::Home, dec!(1000)).is_err());
    }

    #[test]
    fn test_is_expired_ignores_status() {
        let mut quote = Quote::new("CLIENT-1", AssetType::Auto, dec!(25000)).unwrap();
        quote.expires_at = Utc::now() - Duration::hours(1);
        assert!(quote.is_expired(Utc::now()));
    }

    #[test]
    fn test_asset_type_round_trip() {
        for asset in [AssetType::Auto, AssetType::Home, AssetType::Other] {
            let parsed: AssetType = asset.as_str().parse().unwrap();
            assert_eq!(parsed, asset);
        }
    }
}

//! Claim entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ClaimId, ContractId};
use infra_db::{ClaimRow, NewClaim};

use crate::error::ClaimError;

/// The kind of loss being claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    Theft,
    Fire,
    WaterDamage,
    Accident,
    Other,
}

impl ClaimType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Theft => "THEFT",
            ClaimType::Fire => "FIRE",
            ClaimType::WaterDamage => "WATER_DAMAGE",
            ClaimType::Accident => "ACCIDENT",
            ClaimType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimType {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "THEFT" => Ok(ClaimType::Theft),
            "FIRE" => Ok(ClaimType::Fire),
            "WATER_DAMAGE" => Ok(ClaimType::WaterDamage),
            "ACCIDENT" => Ok(ClaimType::Accident),
            "OTHER" => Ok(ClaimType::Other),
            other => Err(ClaimError::validation(format!(
                "unknown claim type '{}'",
                other
            ))),
        }
    }
}

/// Claim status
///
/// DECLARED -> EVALUATED -> INDEMNIFIED | REJECTED. A claim may be
/// rejected from either non-terminal status; the terminal statuses are
/// absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimStatus {
    Declared,
    Evaluated,
    Indemnified,
    Rejected,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Declared => "DECLARED",
            ClaimStatus::Evaluated => "EVALUATED",
            ClaimStatus::Indemnified => "INDEMNIFIED",
            ClaimStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Indemnified | ClaimStatus::Rejected)
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DECLARED" => Ok(ClaimStatus::Declared),
            "EVALUATED" => Ok(ClaimStatus::Evaluated),
            "INDEMNIFIED" => Ok(ClaimStatus::Indemnified),
            "REJECTED" => Ok(ClaimStatus::Rejected),
            other => Err(ClaimError::validation(format!(
                "unknown claim status '{}'",
                other
            ))),
        }
    }
}

/// A declared loss against a contract
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub id: ClaimId,
    pub contract_id: ContractId,
    pub claim_type: ClaimType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub estimated_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessed_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indemnified_amount: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
    pub declared_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
    pub status: ClaimStatus,
}

impl Claim {
    /// Creates a new DECLARED claim.
    ///
    /// The loss must predate the declaration; claims for the future are
    /// refused.
    pub fn declare(
        contract_id: ContractId,
        claim_type: ClaimType,
        description: Option<String>,
        estimated_amount: Decimal,
        occurred_at: DateTime<Utc>,
    ) -> Result<Self, ClaimError> {
        if estimated_amount <= Decimal::ZERO {
            return Err(ClaimError::validation("estimated amount must be positive"));
        }
        let now = Utc::now();
        if occurred_at > now {
            return Err(ClaimError::validation("loss date must not be in the future"));
        }

        Ok(Self {
            id: ClaimId::new(),
            contract_id,
            claim_type,
            description,
            estimated_amount,
            assessed_amount: None,
            indemnified_amount: None,
            occurred_at,
            declared_at: now,
            assessed_at: None,
            paid_at: None,
            status: ClaimStatus::Declared,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_terminal()
    }

    pub(crate) fn as_new_row(&self) -> NewClaim {
        NewClaim {
            id: self.id.to_string(),
            contract_id: self.contract_id.to_string(),
            claim_type: self.claim_type.as_str().to_string(),
            description: self.description.clone(),
            estimated_amount: self.estimated_amount,
            occurred_at: self.occurred_at,
            declared_at: self.declared_at,
        }
    }
}

impl TryFrom<ClaimRow> for Claim {
    type Error = ClaimError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.parse().map_err(|e| {
                ClaimError::validation(format!("bad claim id '{}': {}", row.id, e))
            })?,
            contract_id: row.contract_id.parse().map_err(|e| {
                ClaimError::validation(format!("bad contract id '{}': {}", row.contract_id, e))
            })?,
            claim_type: row.claim_type.parse()?,
            description: row.description,
            estimated_amount: row.estimated_amount,
            assessed_amount: row.assessed_amount,
            indemnified_amount: row.indemnified_amount,
            occurred_at: row.occurred_at,
            declared_at: row.declared_at,
            assessed_at: row.assessed_at,
            paid_at: row.paid_at,
            status: row.status.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    #[test]
    fn test_declare_starts_declared() {
        let claim = Claim::declare(
            ContractId::new(),
            ClaimType::Theft,
            Some("stolen bicycle".to_string()),
            dec!(1200),
            Utc::now() - Duration::hours(4),
        )
        .unwrap();
        assert_eq!(claim.status, ClaimStatus::Declared);
        assert!(!claim.is_closed());
        assert!(claim.assessed_amount.is_none());
    }

    #[test]
    fn test_declare_rejects_future_loss() {
        let result = Claim::declare(
            ContractId::new(),
            ClaimType::Fire,
            None,
            dec!(5000),
            Utc::now() + Duration::days(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_declare_rejects_non_positive_amount() {
        let result = Claim::declare(
            ContractId::new(),
            ClaimType::Accident,
            None,
            dec!(0),
            Utc::now() - Duration::hours(1),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ClaimStatus::Indemnified.is_terminal());
        assert!(ClaimStatus::Rejected.is_terminal());
        assert!(!ClaimStatus::Declared.is_terminal());
        assert!(!ClaimStatus::Evaluated.is_terminal());
    }

    #[test]
    fn test_claim_type_round_trip() {
        for ty in [
            ClaimType::Theft,
            ClaimType::Fire,
            ClaimType::WaterDamage,
            ClaimType::Accident,
            ClaimType::Other,
        ] {
            let parsed: ClaimType = ty.as_str().parse().unwrap();
            assert_eq!(parsed, ty);
        }
    }
}

//! Contract entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ContractId, QuoteId};
use infra_db::{ContractRow, NewContract};

use crate::error::ContractError;

/// Contract status; TERMINATED is absorbing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    Active,
    Modified,
    Terminated,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "ACTIVE",
            ContractStatus::Modified => "MODIFIED",
            ContractStatus::Terminated => "TERMINATED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContractStatus {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ContractStatus::Active),
            "MODIFIED" => Ok(ContractStatus::Modified),
            "TERMINATED" => Ok(ContractStatus::Terminated),
            other => Err(ContractError::validation(format!(
                "unknown contract status '{}'",
                other
            ))),
        }
    }
}

/// Why a contract was terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TerminationReason {
    ClientRequest,
    SevereClaim,
    NonPayment,
    Other,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::ClientRequest => "CLIENT_REQUEST",
            TerminationReason::SevereClaim => "SEVERE_CLAIM",
            TerminationReason::NonPayment => "NON_PAYMENT",
            TerminationReason::Other => "OTHER",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TerminationReason {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT_REQUEST" => Ok(TerminationReason::ClientRequest),
            "SEVERE_CLAIM" => Ok(TerminationReason::SevereClaim),
            "NON_PAYMENT" => Ok(TerminationReason::NonPayment),
            "OTHER" => Ok(TerminationReason::Other),
            other => Err(ContractError::validation(format!(
                "unknown termination reason '{}'",
                other
            ))),
        }
    }
}

/// An active insurance agreement created from a converted quote
///
/// The asset type is carried as the uppercase string it arrives with in the
/// quote notification; this context stores and forwards it, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: ContractId,
    pub quote_id: QuoteId,
    pub client_id: String,
    pub asset_type: String,
    pub premium: Decimal,
    pub effective_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub status: ContractStatus,
}

impl Contract {
    /// Creates a new ACTIVE contract effective now.
    pub fn issue(
        quote_id: QuoteId,
        client_id: impl Into<String>,
        asset_type: impl Into<String>,
        premium: Decimal,
    ) -> Result<Self, ContractError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(ContractError::validation("client id must not be empty"));
        }
        if premium <= Decimal::ZERO {
            return Err(ContractError::validation("premium must be positive"));
        }

        Ok(Self {
            id: ContractId::new(),
            quote_id,
            client_id,
            asset_type: asset_type.into(),
            premium,
            effective_date: Utc::now(),
            end_date: None,
            status: ContractStatus::Active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ContractStatus::Active
    }

    pub(crate) fn as_new_row(&self) -> NewContract {
        NewContract {
            id: self.id.to_string(),
            quote_id: self.quote_id.to_string(),
            client_id: self.client_id.clone(),
            asset_type: self.asset_type.clone(),
            premium: self.premium,
            effective_date: self.effective_date,
        }
    }
}

impl TryFrom<ContractRow> for Contract {
    type Error = ContractError;

    fn try_from(row: ContractRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id.parse().map_err(|e| {
                ContractError::validation(format!("bad contract id '{}': {}", row.id, e))
            })?,
            quote_id: row.quote_id.parse().map_err(|e| {
                ContractError::validation(format!("bad quote id '{}': {}", row.quote_id, e))
            })?,
            client_id: row.client_id,
            asset_type: row.asset_type,
            premium: row.premium,
            effective_date: row.effective_date,
            end_date: row.end_date,
            status: row.status.parse()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_issue_starts_active() {
        let contract = Contract::issue(QuoteId::new(), "CLIENT-1", "AUTO", dec!(500)).unwrap();
        assert!(contract.is_active());
        assert!(contract.end_date.is_none());
    }

    #[test]
    fn test_issue_rejects_non_positive_premium() {
        assert!(Contract::issue(QuoteId::new(), "CLIENT-1", "AUTO", dec!(0)).is_err());
    }

    #[test]
    fn test_termination_reason_round_trip() {
        for reason in [
            TerminationReason::ClientRequest,
            TerminationReason::SevereClaim,
            TerminationReason::NonPayment,
            TerminationReason::Other,
        ] {
            let parsed: TerminationReason = reason.as_str().parse().unwrap();
            assert_eq!(parsed, reason);
        }
    }
}

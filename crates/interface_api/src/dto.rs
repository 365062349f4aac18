//! Request and response data transfer objects

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

/// Success envelope wrapping every response body
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// `limit`/`offset` query parameters
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Clamps the limit into 1..=100 (default 50) and the offset to >= 0.
    pub fn clamped(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    pub client_id: String,
    pub asset_type: String,
    pub asset_value: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueContractRequest {
    pub quote_id: String,
    pub client_id: String,
    pub asset_type: String,
    pub premium: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyContractRequest {
    pub change: String,
    pub new_value: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateContractRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeclareClaimRequest {
    pub contract_id: String,
    pub claim_type: String,
    pub description: Option<String>,
    pub estimated_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateClaimRequest {
    pub assessed_amount: Decimal,
}

/// Payout of an evaluated claim. The amount is the caller's decision and may
/// differ from the assessment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndemnifyClaimRequest {
    pub indemnified_amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let (limit, offset) = Pagination {
            limit: Some(5000),
            offset: Some(-3),
        }
        .clamped();
        assert_eq!(limit, 100);
        assert_eq!(offset, 0);

        let (limit, offset) = Pagination::default().clamped();
        assert_eq!(limit, 50);
        assert_eq!(offset, 0);
    }
}

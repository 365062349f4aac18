//! Topic names and typed event payloads
//!
//! One topic per event kind, named `<context>.<event>`. The payload structs
//! serialize with camelCase field names so the JSON matches what the
//! dashboard and simulator already expect.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Quotation context
pub const TOPIC_QUOTE_GENERATED: &str = "quotation.quote-generated";
pub const TOPIC_QUOTE_EXPIRED: &str = "quotation.quote-expired";

// Subscription context
pub const TOPIC_CONTRACT_ISSUED: &str = "subscription.contract-issued";
pub const TOPIC_CONTRACT_MODIFIED: &str = "subscription.contract-modified";
pub const TOPIC_CONTRACT_TERMINATED: &str = "subscription.contract-terminated";

// Claims context
pub const TOPIC_CLAIM_DECLARED: &str = "claims.claim-declared";
pub const TOPIC_CLAIM_EVALUATED: &str = "claims.claim-evaluated";
pub const TOPIC_INDEMNIFICATION_COMPLETED: &str = "claims.indemnification-completed";

// Declared for parity with the broker setup; nothing redelivers from it.
pub const TOPIC_DLQ_ERRORS: &str = "dlq.errors";

/// Emitted when a new quote is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteGenerated {
    pub quote_id: String,
    pub client_id: String,
    pub asset_type: String,
    pub asset_value: Decimal,
    pub premium: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a quote expires without being converted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteExpired {
    pub quote_id: String,
    pub expires_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a new contract is issued from a quote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractIssued {
    pub contract_id: String,
    pub quote_id: String,
    pub client_id: String,
    pub asset_type: String,
    pub premium: Decimal,
    pub effective_date: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a contract is amended; `new_value` is an opaque pass-through
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractModified {
    pub contract_id: String,
    pub change: String,
    pub new_value: Value,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a contract is terminated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerminated {
    pub contract_id: String,
    pub reason: String,
    pub terminated_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a claim is declared
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimDeclared {
    pub claim_id: String,
    pub contract_id: String,
    pub claim_type: String,
    pub description: Option<String>,
    pub estimated_amount: Decimal,
    pub occurred_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when a claim's assessment is complete
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimEvaluated {
    pub claim_id: String,
    pub assessed_amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the payout has been made
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndemnificationCompleted {
    pub claim_id: String,
    pub contract_id: String,
    pub indemnified_amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub timestamp: DateTime<Utc>,
}

//! Test data builders
//!
//! Builders for row-level test data with sensible defaults, so tests only
//! spell out the fields they actually care about.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{ClaimId, ContractId, QuoteId};
use infra_db::{NewClaim, NewContract, NewQuote};

/// Builder for quote rows
pub struct TestQuoteBuilder {
    id: QuoteId,
    client_id: String,
    asset_type: String,
    asset_value: Decimal,
    premium: Decimal,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Default for TestQuoteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestQuoteBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: QuoteId::new(),
            client_id: "CLIENT-001".to_string(),
            asset_type: "AUTO".to_string(),
            asset_value: dec!(25000),
            premium: dec!(500),
            created_at: now,
            expires_at: now + Duration::days(30),
        }
    }

    pub fn with_id(mut self, id: QuoteId) -> Self {
        self.id = id;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_asset_type(mut self, asset_type: impl Into<String>) -> Self {
        self.asset_type = asset_type.into();
        self
    }

    pub fn with_asset_value(mut self, value: Decimal) -> Self {
        self.asset_value = value;
        self
    }

    pub fn with_premium(mut self, premium: Decimal) -> Self {
        self.premium = premium;
        self
    }

    /// Backdates the quote so it is already past its expiration horizon.
    pub fn already_expired(mut self) -> Self {
        self.created_at = Utc::now() - Duration::days(31);
        self.expires_at = Utc::now() - Duration::days(1);
        self
    }

    pub fn build(self) -> NewQuote {
        NewQuote {
            id: self.id.to_string(),
            client_id: self.client_id,
            asset_type: self.asset_type,
            asset_value: self.asset_value,
            premium: self.premium,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Builder for contract rows
pub struct TestContractBuilder {
    id: ContractId,
    quote_id: QuoteId,
    client_id: String,
    asset_type: String,
    premium: Decimal,
    effective_date: DateTime<Utc>,
}

impl Default for TestContractBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContractBuilder {
    pub fn new() -> Self {
        Self {
            id: ContractId::new(),
            quote_id: QuoteId::new(),
            client_id: "CLIENT-001".to_string(),
            asset_type: "AUTO".to_string(),
            premium: dec!(500),
            effective_date: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: ContractId) -> Self {
        self.id = id;
        self
    }

    pub fn with_quote_id(mut self, quote_id: QuoteId) -> Self {
        self.quote_id = quote_id;
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_premium(mut self, premium: Decimal) -> Self {
        self.premium = premium;
        self
    }

    pub fn build(self) -> NewContract {
        NewContract {
            id: self.id.to_string(),
            quote_id: self.quote_id.to_string(),
            client_id: self.client_id,
            asset_type: self.asset_type,
            premium: self.premium,
            effective_date: self.effective_date,
        }
    }
}

/// Builder for claim rows
pub struct TestClaimBuilder {
    id: ClaimId,
    contract_id: ContractId,
    claim_type: String,
    description: Option<String>,
    estimated_amount: Decimal,
    occurred_at: DateTime<Utc>,
    declared_at: DateTime<Utc>,
}

impl Default for TestClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClaimBuilder {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ClaimId::new(),
            contract_id: ContractId::new(),
            claim_type: "THEFT".to_string(),
            description: Some("test claim".to_string()),
            estimated_amount: dec!(1000),
            occurred_at: now - Duration::hours(6),
            declared_at: now,
        }
    }

    pub fn with_id(mut self, id: ClaimId) -> Self {
        self.id = id;
        self
    }

    pub fn with_contract_id(mut self, contract_id: ContractId) -> Self {
        self.contract_id = contract_id;
        self
    }

    pub fn with_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.claim_type = claim_type.into();
        self
    }

    pub fn with_estimated_amount(mut self, amount: Decimal) -> Self {
        self.estimated_amount = amount;
        self
    }

    /// Backdates the declaration past the auto-processing dwell time.
    pub fn declared_ago(mut self, ago: Duration) -> Self {
        self.declared_at = Utc::now() - ago;
        self
    }

    pub fn build(self) -> NewClaim {
        NewClaim {
            id: self.id.to_string(),
            contract_id: self.contract_id.to_string(),
            claim_type: self.claim_type,
            description: self.description,
            estimated_amount: self.estimated_amount,
            occurred_at: self.occurred_at,
            declared_at: self.declared_at,
        }
    }
}

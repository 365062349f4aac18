//! Subscription service
//!
//! Issues contracts from quotes, amends and terminates them, and consumes
//! the quotation context's notifications to drive the demo's automatic
//! conversions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use core_kernel::{ContractId, QuoteId};
use infra_db::{ContractRepository, EventLogRepository};
use infra_events::topics::{
    ContractIssued, ContractModified, ContractTerminated, QuoteGenerated, TOPIC_CONTRACT_ISSUED,
    TOPIC_CONTRACT_MODIFIED, TOPIC_CONTRACT_TERMINATED,
};
use infra_events::{Delivery, EventEnvelope, EventHandler, EventPublisher, TransportError};

use crate::contract::{Contract, ContractStatus, TerminationReason};
use crate::error::ContractError;

const SOURCE: &str = "subscription";

/// Tuning knobs for the subscription service
#[derive(Debug, Clone)]
pub struct SubscriptionConfig {
    /// Probability that an incoming quote is converted automatically.
    /// Demo animation only; set to 0.0 to make issuance fully manual.
    pub auto_convert_probability: f64,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            auto_convert_probability: 0.70,
        }
    }
}

/// Aggregate counters over all contracts
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractStats {
    pub total: i64,
    pub active: i64,
    pub modified: i64,
    pub terminated: i64,
}

/// Owns the contract state machine
#[derive(Clone)]
pub struct SubscriptionService {
    contracts: ContractRepository,
    events: EventLogRepository,
    publisher: Arc<dyn EventPublisher>,
    config: SubscriptionConfig,
}

impl SubscriptionService {
    pub fn new(
        contracts: ContractRepository,
        events: EventLogRepository,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            contracts,
            events,
            publisher,
            config: SubscriptionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SubscriptionConfig) -> Self {
        self.config = config;
        self
    }

    /// Issues a contract from a converted quote.
    ///
    /// Idempotent-refusing: at most one contract may exist per quote. The
    /// pre-check catches the common case; the UNIQUE constraint on
    /// `quote_id` closes the race between concurrent attempts.
    pub async fn issue_from_quote(
        &self,
        quote_id: QuoteId,
        client_id: &str,
        asset_type: &str,
        premium: Decimal,
    ) -> Result<Contract, ContractError> {
        if self
            .contracts
            .find_by_quote(&quote_id.to_string())
            .await?
            .is_some()
        {
            return Err(ContractError::DuplicateContract(quote_id.to_string()));
        }

        let contract = Contract::issue(quote_id, client_id, asset_type, premium)?;
        self.contracts.create(&contract.as_new_row()).await?;

        self.publish(
            TOPIC_CONTRACT_ISSUED,
            "ContractIssued",
            &ContractIssued {
                contract_id: contract.id.to_string(),
                quote_id: contract.quote_id.to_string(),
                client_id: contract.client_id.clone(),
                asset_type: contract.asset_type.clone(),
                premium: contract.premium,
                effective_date: contract.effective_date,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(
            contract_id = %contract.id,
            quote_id = %contract.quote_id,
            "Contract issued"
        );

        Ok(contract)
    }

    /// Fetches a contract by id.
    pub async fn get_contract(&self, id: &str) -> Result<Option<Contract>, ContractError> {
        let id = parse_id(id)?;
        self.contracts
            .get(&id.to_string())
            .await?
            .map(Contract::try_from)
            .transpose()
    }

    /// All contracts belonging to a client.
    pub async fn contracts_for_client(
        &self,
        client_id: &str,
    ) -> Result<Vec<Contract>, ContractError> {
        let rows = self.contracts.find_by_client(client_id).await?;
        rows.into_iter().map(Contract::try_from).collect()
    }

    /// Paginated listing, newest first.
    pub async fn list_contracts(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Contract>, ContractError> {
        let rows = self.contracts.list(limit, offset).await?;
        rows.into_iter().map(Contract::try_from).collect()
    }

    /// Amends an ACTIVE contract.
    ///
    /// The amendment payload is an opaque pass-through: `new_value` is
    /// forwarded untyped in the notification.
    pub async fn modify_contract(
        &self,
        id: &str,
        change: &str,
        new_value: Value,
    ) -> Result<Contract, ContractError> {
        let id = parse_id(id)?;
        let row = self
            .contracts
            .get(&id.to_string())
            .await?
            .ok_or_else(|| ContractError::NotFound(id.to_string()))?;
        let mut contract = Contract::try_from(row)?;

        if !contract.is_active() {
            return Err(ContractError::NotActive {
                id: id.to_string(),
                status: contract.status.to_string(),
            });
        }

        self.contracts
            .update_status(&id.to_string(), ContractStatus::Modified.as_str())
            .await?;
        contract.status = ContractStatus::Modified;

        self.publish(
            TOPIC_CONTRACT_MODIFIED,
            "ContractModified",
            &ContractModified {
                contract_id: id.to_string(),
                change: change.to_string(),
                new_value,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(contract_id = %id, change, "Contract modified");

        Ok(contract)
    }

    /// Terminates a contract; TERMINATED is absorbing.
    pub async fn terminate_contract(
        &self,
        id: &str,
        reason: TerminationReason,
    ) -> Result<Contract, ContractError> {
        let id = parse_id(id)?;
        let row = self
            .contracts
            .get(&id.to_string())
            .await?
            .ok_or_else(|| ContractError::NotFound(id.to_string()))?;
        let mut contract = Contract::try_from(row)?;

        if contract.status == ContractStatus::Terminated {
            return Err(ContractError::AlreadyTerminated(id.to_string()));
        }

        let terminated_at = Utc::now();
        self.contracts
            .terminate(&id.to_string(), terminated_at)
            .await?;
        contract.status = ContractStatus::Terminated;
        contract.end_date = Some(terminated_at);

        self.publish(
            TOPIC_CONTRACT_TERMINATED,
            "ContractTerminated",
            &ContractTerminated {
                contract_id: id.to_string(),
                reason: reason.to_string(),
                terminated_at,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(contract_id = %id, reason = %reason, "Contract terminated");

        Ok(contract)
    }

    /// Aggregate counters.
    pub async fn stats(&self) -> Result<ContractStats, ContractError> {
        Ok(ContractStats {
            total: self.contracts.count().await?,
            active: self
                .contracts
                .count_by_status(ContractStatus::Active.as_str())
                .await?,
            modified: self
                .contracts
                .count_by_status(ContractStatus::Modified.as_str())
                .await?,
            terminated: self
                .contracts
                .count_by_status(ContractStatus::Terminated.as_str())
                .await?,
        })
    }

    /// Best-effort publish: audit-log the envelope, then hand it to the
    /// transport. Neither failure is propagated.
    async fn publish(&self, topic: &str, event_type: &str, data: &impl Serialize) {
        let envelope = match EventEnvelope::new(event_type, SOURCE, data) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(topic, error = %e, "Failed to build event envelope");
                return;
            }
        };

        if let Err(e) = self
            .events
            .record(
                &envelope.id.to_string(),
                &envelope.event_type,
                &envelope.source,
                &envelope.data.to_string(),
                envelope.timestamp,
            )
            .await
        {
            warn!(topic, error = %e, "Failed to audit-log event");
        }

        if let Err(e) = self.publisher.publish(topic, &envelope).await {
            warn!(topic, error = %e, "Event publish failed, continuing");
        }
    }
}

/// Consumes "quote generated" notifications and decides (randomly, per the
/// configured probability) whether to issue a contract for the quote.
pub struct QuoteGeneratedHandler {
    service: SubscriptionService,
}

impl QuoteGeneratedHandler {
    pub fn new(service: SubscriptionService) -> Self {
        Self { service }
    }
}

#[async_trait]
impl EventHandler for QuoteGeneratedHandler {
    async fn handle(&self, delivery: Delivery) -> Result<(), TransportError> {
        let event: QuoteGenerated = delivery.envelope.decode()?;

        let quote_id: QuoteId = event.quote_id.parse().map_err(|e| {
            TransportError::handler_failed(&delivery.topic, format!("bad quote id: {}", e))
        })?;

        let auto_convert = rand::thread_rng().gen_bool(
            self.service
                .config
                .auto_convert_probability
                .clamp(0.0, 1.0),
        );

        if !auto_convert {
            info!(quote_id = %event.quote_id, "Quote not auto-converted");
            return Ok(());
        }

        match self
            .service
            .issue_from_quote(quote_id, &event.client_id, &event.asset_type, event.premium)
            .await
        {
            Ok(_) => Ok(()),
            // A duplicate here just means this notification was redelivered.
            Err(ContractError::DuplicateContract(quote_id)) => {
                info!(%quote_id, "Contract already issued for quote");
                Ok(())
            }
            Err(e) => Err(TransportError::handler_failed(&delivery.topic, e)),
        }
    }
}

fn parse_id(raw: &str) -> Result<ContractId, ContractError> {
    raw.parse()
        .map_err(|_| ContractError::validation(format!("invalid contract id '{}'", raw)))
}

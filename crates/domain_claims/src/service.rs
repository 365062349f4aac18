//! Claims service
//!
//! Drives claims from declaration to payout. Besides the manual
//! operations, a background sweep assesses claims that have sat in
//! DECLARED long enough and pays out claims that have sat in EVALUATED,
//! so the demo progresses without an adjuster clicking through every
//! claim.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use core_kernel::{ClaimId, ContractId};
use infra_db::{ClaimRepository, EventLogRepository};
use infra_events::topics::{
    ClaimDeclared, ClaimEvaluated, ContractIssued, ContractTerminated, IndemnificationCompleted,
    TOPIC_CLAIM_DECLARED, TOPIC_CLAIM_EVALUATED, TOPIC_INDEMNIFICATION_COMPLETED,
};
use infra_events::{Delivery, EventEnvelope, EventHandler, EventPublisher, TransportError};

use crate::claim::{Claim, ClaimStatus, ClaimType};
use crate::error::ClaimError;

const SOURCE: &str = "claims";

/// Tuning knobs for the claims service
#[derive(Debug, Clone)]
pub struct ClaimsConfig {
    /// How often the auto-processing sweep runs
    pub process_interval: Duration,
    /// How long a claim must sit in a status before the sweep advances it
    pub auto_process_delay: Duration,
    /// Fraction of the estimated amount granted by an automatic assessment
    pub auto_assess_ratio: Decimal,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            process_interval: Duration::from_secs(30),
            auto_process_delay: Duration::from_secs(10),
            auto_assess_ratio: dec!(0.90),
        }
    }
}

/// Aggregate counters over all claims
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimStats {
    pub total: i64,
    pub declared: i64,
    pub evaluated: i64,
    pub indemnified: i64,
    pub rejected: i64,
    pub total_indemnified: Decimal,
}

/// Owns the claim state machine
#[derive(Clone)]
pub struct ClaimsService {
    claims: ClaimRepository,
    events: EventLogRepository,
    publisher: Arc<dyn EventPublisher>,
    config: ClaimsConfig,
}

impl ClaimsService {
    pub fn new(
        claims: ClaimRepository,
        events: EventLogRepository,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            claims,
            events,
            publisher,
            config: ClaimsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClaimsConfig) -> Self {
        self.config = config;
        self
    }

    /// Declares a new claim against a contract.
    ///
    /// The contract lives in another context's store, so only the id's
    /// shape is checked here.
    pub async fn declare_claim(
        &self,
        contract_id: &str,
        claim_type: ClaimType,
        description: Option<String>,
        estimated_amount: Decimal,
        occurred_at: chrono::DateTime<Utc>,
    ) -> Result<Claim, ClaimError> {
        let contract_id: ContractId = contract_id.parse().map_err(|_| {
            ClaimError::validation(format!("invalid contract id '{}'", contract_id))
        })?;

        let claim = Claim::declare(
            contract_id,
            claim_type,
            description,
            estimated_amount,
            occurred_at,
        )?;
        self.claims.create(&claim.as_new_row()).await?;

        self.publish(
            TOPIC_CLAIM_DECLARED,
            "ClaimDeclared",
            &ClaimDeclared {
                claim_id: claim.id.to_string(),
                contract_id: claim.contract_id.to_string(),
                claim_type: claim.claim_type.to_string(),
                description: claim.description.clone(),
                estimated_amount: claim.estimated_amount,
                occurred_at: claim.occurred_at,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(
            claim_id = %claim.id,
            contract_id = %claim.contract_id,
            claim_type = %claim.claim_type,
            estimated = %claim.estimated_amount,
            "Claim declared"
        );

        Ok(claim)
    }

    /// Fetches a claim by id.
    pub async fn get_claim(&self, id: &str) -> Result<Option<Claim>, ClaimError> {
        let id = parse_id(id)?;
        self.claims
            .get(&id.to_string())
            .await?
            .map(Claim::try_from)
            .transpose()
    }

    /// All claims filed against a contract.
    pub async fn claims_for_contract(&self, contract_id: &str) -> Result<Vec<Claim>, ClaimError> {
        let rows = self.claims.find_by_contract(contract_id).await?;
        rows.into_iter().map(Claim::try_from).collect()
    }

    /// Paginated listing, newest first.
    pub async fn list_claims(&self, limit: i64, offset: i64) -> Result<Vec<Claim>, ClaimError> {
        let rows = self.claims.list(limit, offset).await?;
        rows.into_iter().map(Claim::try_from).collect()
    }

    /// Records the assessment of a DECLARED claim.
    pub async fn evaluate_claim(
        &self,
        id: &str,
        assessed_amount: Decimal,
    ) -> Result<Claim, ClaimError> {
        if assessed_amount < Decimal::ZERO {
            return Err(ClaimError::validation(
                "assessed amount must not be negative",
            ));
        }

        let id = parse_id(id)?;
        let mut claim = self.load(&id).await?;

        let assessed_at = Utc::now();
        match self
            .claims
            .assess(&id.to_string(), assessed_amount, assessed_at)
            .await
        {
            Ok(()) => {}
            // The claim exists but was not DECLARED anymore when the
            // guarded update ran.
            Err(e) if e.is_not_found() => {
                return Err(self.state_conflict(&id, claim, ClaimStatus::Declared).await);
            }
            Err(e) => return Err(e.into()),
        }
        claim.status = ClaimStatus::Evaluated;
        claim.assessed_amount = Some(assessed_amount);
        claim.assessed_at = Some(assessed_at);

        self.publish(
            TOPIC_CLAIM_EVALUATED,
            "ClaimEvaluated",
            &ClaimEvaluated {
                claim_id: id.to_string(),
                assessed_amount,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(claim_id = %id, assessed = %assessed_amount, "Claim evaluated");

        Ok(claim)
    }

    /// Pays out an EVALUATED claim at the given amount. The payout does not
    /// have to match the assessment.
    pub async fn indemnify_claim(&self, id: &str, amount: Decimal) -> Result<Claim, ClaimError> {
        if amount <= Decimal::ZERO {
            return Err(ClaimError::validation(
                "indemnified amount must be positive",
            ));
        }

        let id = parse_id(id)?;
        let mut claim = self.load(&id).await?;

        let paid_at = Utc::now();
        match self.claims.settle(&id.to_string(), amount, paid_at).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Err(self.state_conflict(&id, claim, ClaimStatus::Evaluated).await);
            }
            Err(e) => return Err(e.into()),
        }
        claim.status = ClaimStatus::Indemnified;
        claim.indemnified_amount = Some(amount);
        claim.paid_at = Some(paid_at);

        self.publish(
            TOPIC_INDEMNIFICATION_COMPLETED,
            "IndemnificationCompleted",
            &IndemnificationCompleted {
                claim_id: id.to_string(),
                contract_id: claim.contract_id.to_string(),
                indemnified_amount: amount,
                paid_at,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(claim_id = %id, amount = %amount, "Claim indemnified");

        Ok(claim)
    }

    /// Rejects a claim from either non-terminal status.
    pub async fn reject_claim(&self, id: &str) -> Result<Claim, ClaimError> {
        let id = parse_id(id)?;
        let mut claim = self.load(&id).await?;

        if claim.is_closed() {
            return Err(ClaimError::AlreadyClosed(id.to_string()));
        }

        self.claims
            .update_status(&id.to_string(), ClaimStatus::Rejected.as_str())
            .await?;
        claim.status = ClaimStatus::Rejected;

        info!(claim_id = %id, "Claim rejected");

        Ok(claim)
    }

    /// Aggregate counters plus the total paid out.
    pub async fn stats(&self) -> Result<ClaimStats, ClaimError> {
        Ok(ClaimStats {
            total: self.claims.count().await?,
            declared: self
                .claims
                .count_by_status(ClaimStatus::Declared.as_str())
                .await?,
            evaluated: self
                .claims
                .count_by_status(ClaimStatus::Evaluated.as_str())
                .await?,
            indemnified: self
                .claims
                .count_by_status(ClaimStatus::Indemnified.as_str())
                .await?,
            rejected: self
                .claims
                .count_by_status(ClaimStatus::Rejected.as_str())
                .await?,
            total_indemnified: self.claims.total_indemnified().await?,
        })
    }

    /// Runs the auto-processing sweep until the shutdown signal fires.
    pub async fn run_auto_process(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.process_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        info!(
            interval = ?self.config.process_interval,
            delay = ?self.config.auto_process_delay,
            "Claims auto-processing started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.process_evaluations().await {
                        error!(error = %e, "Auto-assessment pass failed");
                    }
                    if let Err(e) = self.process_indemnifications().await {
                        error!(error = %e, "Auto-payout pass failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Claims auto-processing stopped");
                    break;
                }
            }
        }
    }

    /// One pass over idle DECLARED claims: assesses each at the configured
    /// fraction of its estimate. Returns how many claims were assessed.
    pub async fn process_evaluations(&self) -> Result<usize, ClaimError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.auto_process_delay)
                .unwrap_or_else(|_| chrono::Duration::seconds(10));
        let idle = self.claims.find_declared_before(cutoff).await?;
        let mut assessed = 0;

        for row in idle {
            let amount = (row.estimated_amount * self.config.auto_assess_ratio).round_dp(2);
            match self.evaluate_claim(&row.id, amount).await {
                Ok(_) => assessed += 1,
                // Lost the race against a manual call; nothing to do.
                Err(ClaimError::InvalidState { .. }) => {}
                Err(e) => {
                    error!(claim_id = %row.id, error = %e, "Auto-assessment failed");
                }
            }
        }

        if assessed > 0 {
            info!(count = assessed, "Auto-assessment pass complete");
        }

        Ok(assessed)
    }

    /// One pass over idle EVALUATED claims: pays each out at its assessed
    /// amount. Returns how many claims were paid.
    pub async fn process_indemnifications(&self) -> Result<usize, ClaimError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.config.auto_process_delay)
                .unwrap_or_else(|_| chrono::Duration::seconds(10));
        let idle = self.claims.find_evaluated_before(cutoff).await?;
        let mut paid = 0;

        for row in idle {
            let amount = row.assessed_amount.unwrap_or(row.estimated_amount);
            match self.indemnify_claim(&row.id, amount).await {
                Ok(_) => paid += 1,
                Err(ClaimError::InvalidState { .. }) => {}
                Err(e) => {
                    error!(claim_id = %row.id, error = %e, "Auto-payout failed");
                }
            }
        }

        if paid > 0 {
            info!(count = paid, "Auto-payout pass complete");
        }

        Ok(paid)
    }

    /// The guarded update matched no row, so the claim left `expected`
    /// between the load and the write. Reports the status it holds now.
    async fn state_conflict(
        &self,
        id: &ClaimId,
        loaded: Claim,
        expected: ClaimStatus,
    ) -> ClaimError {
        let status = match self.claims.get(&id.to_string()).await {
            Ok(Some(row)) => row.status,
            _ => loaded.status.to_string(),
        };
        ClaimError::invalid_state(id.to_string(), status, expected.as_str())
    }

    async fn load(&self, id: &ClaimId) -> Result<Claim, ClaimError> {
        let row = self
            .claims
            .get(&id.to_string())
            .await?
            .ok_or_else(|| ClaimError::NotFound(id.to_string()))?;
        Claim::try_from(row)
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

/// Logs newly issued contracts so declared claims can be read against the
/// contract ids seen on the wire.
pub struct ContractIssuedHandler;

#[async_trait]
impl EventHandler for ContractIssuedHandler {
    async fn handle(&self, delivery: Delivery) -> Result<(), TransportError> {
        let event: ContractIssued = delivery.envelope.decode()?;
        info!(
            contract_id = %event.contract_id,
            client_id = %event.client_id,
            "Contract issued, claims may now be declared against it"
        );
        Ok(())
    }
}

/// Logs contract terminations; open claims stay open and finish their
/// lifecycle regardless.
pub struct ContractTerminatedHandler;

#[async_trait]
impl EventHandler for ContractTerminatedHandler {
    async fn handle(&self, delivery: Delivery) -> Result<(), TransportError> {
        let event: ContractTerminated = delivery.envelope.decode()?;
        info!(
            contract_id = %event.contract_id,
            reason = %event.reason,
            "Contract terminated, open claims continue unaffected"
        );
        Ok(())
    }
}

fn parse_id(raw: &str) -> Result<ClaimId, ClaimError> {
    raw.parse()
        .map_err(|_| ClaimError::validation(format!("invalid claim id '{}'", raw)))
}

//! Quotation service
//!
//! Orchestrates the quote lifecycle against storage and the event
//! transport. Publishing is best effort throughout: a failed notification
//! is logged and swallowed, the persisted state change stands.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{error, info, warn};

use core_kernel::QuoteId;
use infra_db::{EventLogRepository, QuoteRepository};
use infra_events::topics::{
    QuoteExpired, QuoteGenerated, TOPIC_QUOTE_EXPIRED, TOPIC_QUOTE_GENERATED,
};
use infra_events::{EventEnvelope, EventPublisher};

use crate::error::QuoteError;
use crate::quote::{AssetType, Quote, QuoteStatus};

const SOURCE: &str = "quotation";

/// Tuning knobs for the quotation service
#[derive(Debug, Clone)]
pub struct QuotationConfig {
    /// How often the expiry sweep scans for overdue quotes
    pub expiry_interval: Duration,
}

impl Default for QuotationConfig {
    fn default() -> Self {
        Self {
            expiry_interval: Duration::from_secs(60),
        }
    }
}

/// Aggregate counters over all quotes
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub total: i64,
    pub generated: i64,
    pub converted: i64,
    pub expired: i64,
    /// Share of decided quotes (converted or expired) that converted, in percent
    pub conversion_rate: f64,
}

/// Owns the quote state machine
#[derive(Clone)]
pub struct QuotationService {
    quotes: QuoteRepository,
    events: EventLogRepository,
    publisher: Arc<dyn EventPublisher>,
    config: QuotationConfig,
}

impl QuotationService {
    pub fn new(
        quotes: QuoteRepository,
        events: EventLogRepository,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            quotes,
            events,
            publisher,
            config: QuotationConfig::default(),
        }
    }

    pub fn with_config(mut self, config: QuotationConfig) -> Self {
        self.config = config;
        self
    }

    /// Rates, persists and announces a new quote.
    pub async fn create_quote(
        &self,
        client_id: &str,
        asset_type: AssetType,
        asset_value: Decimal,
    ) -> Result<Quote, QuoteError> {
        let quote = Quote::new(client_id, asset_type, asset_value)?;

        self.quotes.create(&quote.as_new_row()).await?;

        self.publish(
            TOPIC_QUOTE_GENERATED,
            "QuoteGenerated",
            &QuoteGenerated {
                quote_id: quote.id.to_string(),
                client_id: quote.client_id.clone(),
                asset_type: quote.asset_type.to_string(),
                asset_value: quote.asset_value,
                premium: quote.premium,
                timestamp: Utc::now(),
            },
        )
        .await;

        info!(
            quote_id = %quote.id,
            client_id = %quote.client_id,
            asset_type = %quote.asset_type,
            premium = %quote.premium,
            "Quote created"
        );

        Ok(quote)
    }

    /// Fetches a quote by id.
    pub async fn get_quote(&self, id: &str) -> Result<Option<Quote>, QuoteError> {
        let id = parse_id(id)?;
        self.quotes
            .get(&id.to_string())
            .await?
            .map(Quote::try_from)
            .transpose()
    }

    /// All quotes belonging to a client.
    pub async fn quotes_for_client(&self, client_id: &str) -> Result<Vec<Quote>, QuoteError> {
        let rows = self.quotes.find_by_client(client_id).await?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    /// Paginated listing, newest first.
    pub async fn list_quotes(&self, limit: i64, offset: i64) -> Result<Vec<Quote>, QuoteError> {
        let rows = self.quotes.list(limit, offset).await?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    /// Flips a quote to CONVERTED.
    ///
    /// Refuses when the quote is missing, past its expiration horizon
    /// (regardless of stored status) or no longer GENERATED. A second call
    /// on a converted quote errors and leaves the status untouched.
    pub async fn convert_quote(&self, id: &str) -> Result<Quote, QuoteError> {
        let id = parse_id(id)?;
        let row = self
            .quotes
            .get(&id.to_string())
            .await?
            .ok_or_else(|| QuoteError::NotFound(id.to_string()))?;
        let mut quote = Quote::try_from(row)?;

        if quote.is_expired(Utc::now()) {
            return Err(QuoteError::Expired(id.to_string()));
        }
        if quote.status != QuoteStatus::Generated {
            return Err(QuoteError::NotConvertible {
                id: id.to_string(),
                status: quote.status.to_string(),
            });
        }

        self.quotes
            .update_status(&id.to_string(), QuoteStatus::Converted.as_str())
            .await?;
        quote.status = QuoteStatus::Converted;

        info!(quote_id = %id, "Quote converted");

        Ok(quote)
    }

    /// Aggregate counters plus conversion rate.
    pub async fn stats(&self) -> Result<QuoteStats, QuoteError> {
        let total = self.quotes.count().await?;
        let generated = self
            .quotes
            .count_by_status(QuoteStatus::Generated.as_str())
            .await?;
        let converted = self
            .quotes
            .count_by_status(QuoteStatus::Converted.as_str())
            .await?;
        let expired = self
            .quotes
            .count_by_status(QuoteStatus::Expired.as_str())
            .await?;

        let decided = total - generated;
        let conversion_rate = if decided > 0 {
            converted as f64 / decided as f64 * 100.0
        } else {
            0.0
        };

        Ok(QuoteStats {
            total,
            generated,
            converted,
            expired,
            conversion_rate,
        })
    }

    /// Runs the expiry sweep until the shutdown signal fires.
    pub async fn run_expiry_sweep(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.expiry_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so startup stays quiet.
        ticker.tick().await;

        info!(interval = ?self.config.expiry_interval, "Expiry sweep started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.process_expirations().await {
                        error!(error = %e, "Expiry sweep pass failed");
                    }
                }
                _ = shutdown.changed() => {
                    info!("Expiry sweep stopped");
                    break;
                }
            }
        }
    }

    /// One sweep pass: flips overdue GENERATED quotes to EXPIRED and
    /// announces each one. Returns how many quotes were expired.
    pub async fn process_expirations(&self) -> Result<usize, QuoteError> {
        let overdue = self.quotes.find_expired(Utc::now()).await?;
        let mut flipped = 0;

        for row in overdue {
            if let Err(e) = self
                .quotes
                .update_status(&row.id, QuoteStatus::Expired.as_str())
                .await
            {
                error!(quote_id = %row.id, error = %e, "Failed to mark quote expired");
                continue;
            }

            self.publish(
                TOPIC_QUOTE_EXPIRED,
                "QuoteExpired",
                &QuoteExpired {
                    quote_id: row.id.clone(),
                    expires_at: row.expires_at,
                    timestamp: Utc::now(),
                },
            )
            .await;

            info!(quote_id = %row.id, "Quote expired");
            flipped += 1;
        }

        if flipped > 0 {
            info!(count = flipped, "Expiry sweep pass complete");
        }

        Ok(flipped)
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

fn parse_id(raw: &str) -> Result<QuoteId, QuoteError> {
    raw.parse()
        .map_err(|_| QuoteError::validation(format!("invalid quote id '{}'", raw)))
}

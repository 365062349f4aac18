//! Cross-context event flow
//!
//! Wires the quotation and subscription services over one in-memory bus and
//! verifies that a published quote drives automatic contract issuance.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::watch;

use domain_quotation::{AssetType, QuotationService};
use domain_subscription::{
    QuoteGeneratedHandler, SubscriptionConfig, SubscriptionService,
};
use infra_db::{ContractRepository, EventLogRepository, QuoteRepository};
use infra_events::topics::TOPIC_QUOTE_GENERATED;
use infra_events::{MemoryBus, MemorySubscriber};
use test_utils::test_pool;

#[tokio::test]
async fn test_quote_generated_event_issues_contract() {
    let bus = MemoryBus::new();

    let quotation_pool = test_pool().await;
    let quotation = QuotationService::new(
        QuoteRepository::new(quotation_pool.clone()),
        EventLogRepository::new(quotation_pool),
        Arc::new(bus.clone()),
    );

    let subscription_pool = test_pool().await;
    let subscription = SubscriptionService::new(
        ContractRepository::new(subscription_pool.clone()),
        EventLogRepository::new(subscription_pool),
        Arc::new(bus.clone()),
    )
    .with_config(SubscriptionConfig {
        auto_convert_probability: 1.0,
    });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let subscriber = MemorySubscriber::new(bus).on(
        TOPIC_QUOTE_GENERATED,
        Arc::new(QuoteGeneratedHandler::new(subscription.clone())),
    );
    let consumer = tokio::spawn(async move { subscriber.run(shutdown_rx).await });

    // Give the forwarding tasks a moment to subscribe before publishing.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let quote = quotation
        .create_quote("CLIENT-001", AssetType::Auto, Decimal::from(25000))
        .await
        .unwrap();

    // Poll until the consumer has processed the notification.
    let mut contracts = Vec::new();
    for _ in 0..50 {
        contracts = subscription.contracts_for_client("CLIENT-001").await.unwrap();
        if !contracts.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].quote_id, quote.id);
    assert_eq!(contracts[0].premium, quote.premium);

    let _ = shutdown_tx.send(true);
    let _ = consumer.await;
}

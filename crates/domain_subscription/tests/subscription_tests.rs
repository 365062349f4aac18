//! Subscription service tests

use std::sync::Arc;

use chrono::Utc;
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::QuoteId;
use domain_subscription::{
    ContractError, ContractStatus, QuoteGeneratedHandler, SubscriptionConfig, SubscriptionService,
    TerminationReason,
};
use infra_db::{ContractRepository, EventLogRepository};
use infra_events::topics::{
    QuoteGenerated, TOPIC_CONTRACT_ISSUED, TOPIC_CONTRACT_MODIFIED, TOPIC_CONTRACT_TERMINATED,
    TOPIC_QUOTE_GENERATED,
};
use infra_events::{Delivery, EventEnvelope, EventHandler};
use test_utils::{test_pool, EventCapture};

async fn service_with_capture() -> (SubscriptionService, EventCapture) {
    let pool = test_pool().await;
    let capture = EventCapture::on_topics(&[
        TOPIC_CONTRACT_ISSUED,
        TOPIC_CONTRACT_MODIFIED,
        TOPIC_CONTRACT_TERMINATED,
    ]);
    let service = SubscriptionService::new(
        ContractRepository::new(pool.clone()),
        EventLogRepository::new(pool),
        capture.publisher(),
    );
    (service, capture)
}

fn quote_generated_delivery(quote_id: &QuoteId) -> Delivery {
    let event = QuoteGenerated {
        quote_id: quote_id.to_string(),
        client_id: "CLIENT-001".to_string(),
        asset_type: "AUTO".to_string(),
        asset_value: dec!(25000),
        premium: dec!(500),
        timestamp: Utc::now(),
    };
    Delivery {
        topic: TOPIC_QUOTE_GENERATED.to_string(),
        envelope: EventEnvelope::new("QuoteGenerated", "quotation", &event).unwrap(),
    }
}

mod issuance_tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_from_quote() {
        let (service, mut capture) = service_with_capture().await;

        let quote_id = QuoteId::new();
        let contract = service
            .issue_from_quote(quote_id, "CLIENT-001", "AUTO", dec!(500))
            .await
            .unwrap();

        assert_eq!(contract.status, ContractStatus::Active);
        assert_eq!(contract.quote_id, quote_id);
        assert!(contract.end_date.is_none());

        let published = capture.drain(TOPIC_CONTRACT_ISSUED);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].envelope.event_type, "ContractIssued");
    }

    #[tokio::test]
    async fn test_at_most_one_contract_per_quote() {
        let (service, _) = service_with_capture().await;

        let quote_id = QuoteId::new();
        service
            .issue_from_quote(quote_id, "CLIENT-001", "AUTO", dec!(500))
            .await
            .unwrap();

        let second = service
            .issue_from_quote(quote_id, "CLIENT-001", "AUTO", dec!(500))
            .await;
        assert!(matches!(second, Err(ContractError::DuplicateContract(_))));

        let contracts = service.contracts_for_client("CLIENT-001").await.unwrap();
        assert_eq!(contracts.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_issuance_yields_one_contract() {
        let (service, _) = service_with_capture().await;

        let quote_id = QuoteId::new();
        let (a, b) = tokio::join!(
            service.issue_from_quote(quote_id, "CLIENT-001", "AUTO", dec!(500)),
            service.issue_from_quote(quote_id, "CLIENT-001", "AUTO", dec!(500)),
        );

        // Exactly one attempt wins, the other sees the duplicate.
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

        let contracts = service.contracts_for_client("CLIENT-001").await.unwrap();
        assert_eq!(contracts.len(), 1);
    }

    #[tokio::test]
    async fn test_issue_rejects_bad_input() {
        let (service, _) = service_with_capture().await;

        assert!(matches!(
            service
                .issue_from_quote(QuoteId::new(), "  ", "AUTO", dec!(500))
                .await,
            Err(ContractError::Validation(_))
        ));
        assert!(matches!(
            service
                .issue_from_quote(QuoteId::new(), "CLIENT-001", "AUTO", dec!(-1))
                .await,
            Err(ContractError::Validation(_))
        ));
    }
}

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_modify_requires_active_contract() {
        let (service, mut capture) = service_with_capture().await;

        let contract = service
            .issue_from_quote(QuoteId::new(), "CLIENT-001", "HOME", dec!(1500))
            .await
            .unwrap();
        let id = contract.id.to_string();

        let modified = service
            .modify_contract(&id, "coverage", json!({"deductible": 250}))
            .await
            .unwrap();
        assert_eq!(modified.status, ContractStatus::Modified);
        assert_eq!(capture.drain(TOPIC_CONTRACT_MODIFIED).len(), 1);

        // MODIFIED is not ACTIVE, so a second amendment is refused.
        let again = service
            .modify_contract(&id, "coverage", json!({"deductible": 500}))
            .await;
        assert!(matches!(again, Err(ContractError::NotActive { .. })));
    }

    #[tokio::test]
    async fn test_terminate_is_absorbing() {
        let (service, mut capture) = service_with_capture().await;

        let contract = service
            .issue_from_quote(QuoteId::new(), "CLIENT-001", "AUTO", dec!(500))
            .await
            .unwrap();
        let id = contract.id.to_string();

        let terminated = service
            .terminate_contract(&id, TerminationReason::ClientRequest)
            .await
            .unwrap();
        assert_eq!(terminated.status, ContractStatus::Terminated);
        assert!(terminated.end_date.is_some());
        assert_eq!(capture.drain(TOPIC_CONTRACT_TERMINATED).len(), 1);

        let again = service
            .terminate_contract(&id, TerminationReason::Other)
            .await;
        assert!(matches!(again, Err(ContractError::AlreadyTerminated(_))));

        let modify = service
            .modify_contract(&id, "coverage", json!({"deductible": 100}))
            .await;
        assert!(matches!(modify, Err(ContractError::NotActive { .. })));
    }

    #[tokio::test]
    async fn test_terminate_missing_contract() {
        let (service, _) = service_with_capture().await;
        let missing = core_kernel::ContractId::new();
        assert!(matches!(
            service
                .terminate_contract(&missing.to_string(), TerminationReason::Other)
                .await,
            Err(ContractError::NotFound(_))
        ));
    }
}

mod auto_convert_tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_issues_contract_at_probability_one() {
        let (service, _) = service_with_capture().await;
        let service = service.with_config(SubscriptionConfig {
            auto_convert_probability: 1.0,
        });
        let handler = QuoteGeneratedHandler::new(service.clone());

        let quote_id = QuoteId::new();
        handler
            .handle(quote_generated_delivery(&quote_id))
            .await
            .unwrap();

        let contracts = service.contracts_for_client("CLIENT-001").await.unwrap();
        assert_eq!(contracts.len(), 1);
        assert_eq!(contracts[0].quote_id, quote_id);
    }

    #[tokio::test]
    async fn test_handler_skips_at_probability_zero() {
        let (service, _) = service_with_capture().await;
        let service = service.with_config(SubscriptionConfig {
            auto_convert_probability: 0.0,
        });
        let handler = QuoteGeneratedHandler::new(service.clone());

        handler
            .handle(quote_generated_delivery(&QuoteId::new()))
            .await
            .unwrap();

        let contracts = service.contracts_for_client("CLIENT-001").await.unwrap();
        assert!(contracts.is_empty());
    }

    #[tokio::test]
    async fn test_handler_tolerates_redelivery() {
        let (service, _) = service_with_capture().await;
        let service = service.with_config(SubscriptionConfig {
            auto_convert_probability: 1.0,
        });
        let handler = QuoteGeneratedHandler::new(service.clone());

        let quote_id = QuoteId::new();
        handler
            .handle(quote_generated_delivery(&quote_id))
            .await
            .unwrap();
        // The duplicate is absorbed, not surfaced as a handler failure.
        handler
            .handle(quote_generated_delivery(&quote_id))
            .await
            .unwrap();

        let contracts = service.contracts_for_client("CLIENT-001").await.unwrap();
        assert_eq!(contracts.len(), 1);
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_count_by_status() {
        let (service, _) = service_with_capture().await;

        let a = service
            .issue_from_quote(QuoteId::new(), "CLIENT-001", "AUTO", dec!(500))
            .await
            .unwrap();
        let b = service
            .issue_from_quote(QuoteId::new(), "CLIENT-001", "HOME", dec!(1500))
            .await
            .unwrap();
        service
            .issue_from_quote(QuoteId::new(), "CLIENT-002", "OTHER", dec!(250))
            .await
            .unwrap();

        service
            .modify_contract(&a.id.to_string(), "coverage", json!({"x": 1}))
            .await
            .unwrap();
        service
            .terminate_contract(&b.id.to_string(), TerminationReason::NonPayment)
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.modified, 1);
        assert_eq!(stats.terminated, 1);
    }
}

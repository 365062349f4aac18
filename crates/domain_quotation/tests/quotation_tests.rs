//! Quotation service tests

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal_macros::dec;

use domain_quotation::{premium_for, AssetType, QuotationService, QuoteError, QuoteStatus};
use infra_db::{EventLogRepository, QuoteRepository};
use infra_events::topics::{QuoteExpired, TOPIC_QUOTE_EXPIRED, TOPIC_QUOTE_GENERATED};
use infra_events::{EventEnvelope, EventPublisher, TransportError};
use test_utils::{test_pool, EventCapture, TestQuoteBuilder};

async fn service_with_capture() -> (QuotationService, QuoteRepository, EventCapture) {
    let pool = test_pool().await;
    let capture = EventCapture::on_topics(&[TOPIC_QUOTE_GENERATED, TOPIC_QUOTE_EXPIRED]);
    let repo = QuoteRepository::new(pool.clone());
    let service = QuotationService::new(
        repo.clone(),
        EventLogRepository::new(pool),
        capture.publisher(),
    );
    (service, repo, capture)
}

mod rating_tests {
    use super::*;

    #[test]
    fn test_auto_rate_reference_value() {
        assert_eq!(premium_for(AssetType::Auto, dec!(25000)), dec!(500.00));
    }

    #[test]
    fn test_rate_table() {
        assert_eq!(premium_for(AssetType::Home, dec!(200000)), dec!(3000.000));
        assert_eq!(premium_for(AssetType::Other, dec!(1000)), dec!(25.000));
    }

    proptest::proptest! {
        #[test]
        fn prop_premium_is_deterministic(value in 1u32..10_000_000u32) {
            let value = rust_decimal::Decimal::from(value);
            for asset_type in [AssetType::Auto, AssetType::Home, AssetType::Other] {
                let first = premium_for(asset_type, value);
                let second = premium_for(asset_type, value);
                proptest::prop_assert_eq!(first, second);
                proptest::prop_assert_eq!(first, value * asset_type.rate());
            }
        }
    }
}

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_quote_persists_and_publishes() {
        let (service, _, mut capture) = service_with_capture().await;

        let quote = service
            .create_quote("CLIENT-001", AssetType::Auto, dec!(25000))
            .await
            .unwrap();

        assert_eq!(quote.status, QuoteStatus::Generated);
        assert_eq!(quote.premium, dec!(500.00));

        let stored = service.get_quote(&quote.id.to_string()).await.unwrap();
        assert!(stored.is_some());

        let published = capture.drain(TOPIC_QUOTE_GENERATED);
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].envelope.event_type, "QuoteGenerated");
    }

    #[tokio::test]
    async fn test_create_quote_rejects_bad_input() {
        let (service, _, _) = service_with_capture().await;

        assert!(matches!(
            service.create_quote("  ", AssetType::Auto, dec!(1000)).await,
            Err(QuoteError::Validation(_))
        ));
        assert!(matches!(
            service.create_quote("CLIENT-001", AssetType::Auto, dec!(0)).await,
            Err(QuoteError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_convert_quote_once() {
        let (service, _, _) = service_with_capture().await;

        let quote = service
            .create_quote("CLIENT-001", AssetType::Home, dec!(100000))
            .await
            .unwrap();

        let converted = service.convert_quote(&quote.id.to_string()).await.unwrap();
        assert_eq!(converted.status, QuoteStatus::Converted);

        // A second conversion attempt errors and leaves the status alone.
        let err = service.convert_quote(&quote.id.to_string()).await;
        assert!(matches!(err, Err(QuoteError::NotConvertible { .. })));

        let stored = service
            .get_quote(&quote.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, QuoteStatus::Converted);
    }

    #[tokio::test]
    async fn test_convert_missing_quote() {
        let (service, _, _) = service_with_capture().await;
        let missing = core_kernel::QuoteId::new();
        assert!(matches!(
            service.convert_quote(&missing.to_string()).await,
            Err(QuoteError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_quote_is_never_convertible() {
        let (service, repo, _) = service_with_capture().await;

        let stale = TestQuoteBuilder::new().already_expired().build();
        repo.create(&stale).await.unwrap();

        // Before the sweep flips it, conversion already fails on the window.
        let err = service.convert_quote(&stale.id).await;
        assert!(matches!(err, Err(QuoteError::Expired(_))));

        service.process_expirations().await.unwrap();

        // After the flip, the stored status blocks it too.
        let err = service.convert_quote(&stale.id).await;
        assert!(matches!(err, Err(QuoteError::Expired(_))));
    }
}

mod sweep_tests {
    use super::*;

    #[tokio::test]
    async fn test_sweep_flips_only_overdue_quotes() {
        let (service, repo, mut capture) = service_with_capture().await;

        let stale = TestQuoteBuilder::new().already_expired().build();
        repo.create(&stale).await.unwrap();
        let fresh = service
            .create_quote("CLIENT-002", AssetType::Auto, dec!(30000))
            .await
            .unwrap();

        let flipped = service.process_expirations().await.unwrap();
        assert_eq!(flipped, 1);

        let stale_after = service.get_quote(&stale.id).await.unwrap().unwrap();
        assert_eq!(stale_after.status, QuoteStatus::Expired);
        let fresh_after = service
            .get_quote(&fresh.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh_after.status, QuoteStatus::Generated);

        let published = capture.drain(TOPIC_QUOTE_EXPIRED);
        assert_eq!(published.len(), 1);
        let event: QuoteExpired = published[0].envelope.decode().unwrap();
        assert_eq!(event.quote_id, stale.id);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let (service, repo, _) = service_with_capture().await;

        let stale = TestQuoteBuilder::new().already_expired().build();
        repo.create(&stale).await.unwrap();

        assert_eq!(service.process_expirations().await.unwrap(), 1);
        assert_eq!(service.process_expirations().await.unwrap(), 0);
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_conversion_rate_counts_only_decided_quotes() {
        let (service, repo, _) = service_with_capture().await;

        let converted = service
            .create_quote("CLIENT-001", AssetType::Auto, dec!(25000))
            .await
            .unwrap();
        service
            .convert_quote(&converted.id.to_string())
            .await
            .unwrap();

        let stale = TestQuoteBuilder::new().already_expired().build();
        repo.create(&stale).await.unwrap();
        service.process_expirations().await.unwrap();

        // One still pending, so it stays out of the rate.
        service
            .create_quote("CLIENT-002", AssetType::Home, dec!(80000))
            .await
            .unwrap();

        let stats = service.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.converted, 1);
        assert_eq!(stats.expired, 1);
        assert!((stats.conversion_rate - 50.0).abs() < f64::EPSILON);
    }
}

mod publish_failure_tests {
    use super::*;

    struct FailingPublisher;

    #[async_trait]
    impl EventPublisher for FailingPublisher {
        async fn publish(
            &self,
            topic: &str,
            _envelope: &EventEnvelope,
        ) -> Result<(), TransportError> {
            Err(TransportError::publish_failed(topic, "broker down"))
        }
    }

    #[tokio::test]
    async fn test_create_quote_survives_publish_failure() {
        let pool = test_pool().await;
        let service = QuotationService::new(
            QuoteRepository::new(pool.clone()),
            EventLogRepository::new(pool),
            Arc::new(FailingPublisher),
        );

        let quote = service
            .create_quote("CLIENT-001", AssetType::Auto, dec!(25000))
            .await
            .unwrap();

        let stored = service
            .get_quote(&quote.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, QuoteStatus::Generated);
    }

    #[tokio::test]
    async fn test_expiry_sweep_survives_publish_failure() {
        let pool = test_pool().await;
        let repo = QuoteRepository::new(pool.clone());
        let service = QuotationService::new(
            repo.clone(),
            EventLogRepository::new(pool),
            Arc::new(FailingPublisher),
        );

        let stale = TestQuoteBuilder::new().already_expired().build();
        repo.create(&stale).await.unwrap();

        assert_eq!(service.process_expirations().await.unwrap(), 1);
        let after = service.get_quote(&stale.id).await.unwrap().unwrap();
        assert_eq!(after.status, QuoteStatus::Expired);
    }
}

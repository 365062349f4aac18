//! HTTP facade tests
//!
//! Exercises the routers over in-memory storage and the in-memory bus.

use std::sync::Arc;

use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use domain_claims::ClaimsService;
use domain_quotation::QuotationService;
use domain_subscription::SubscriptionService;
use infra_db::{ClaimRepository, ContractRepository, EventLogRepository, QuoteRepository};
use infra_events::MemoryBus;
use interface_api::{
    claims_router, quotation_router, subscription_router, ClaimsState, QuotationState,
    SubscriptionState,
};
use test_utils::test_pool;

async fn quotation_server() -> TestServer {
    let pool = test_pool().await;
    let service = QuotationService::new(
        QuoteRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        Arc::new(MemoryBus::new()),
    );
    TestServer::new(quotation_router(QuotationState { pool, service })).unwrap()
}

async fn subscription_server() -> TestServer {
    let pool = test_pool().await;
    let service = SubscriptionService::new(
        ContractRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        Arc::new(MemoryBus::new()),
    );
    TestServer::new(subscription_router(SubscriptionState { pool, service })).unwrap()
}

async fn claims_server() -> TestServer {
    let pool = test_pool().await;
    let service = ClaimsService::new(
        ClaimRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        Arc::new(MemoryBus::new()),
    );
    TestServer::new(claims_router(ClaimsState { pool, service })).unwrap()
}

mod quotation_api_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_fetch_quote() {
        let server = quotation_server().await;

        let response = server
            .post("/api/v1/quotes")
            .json(&json!({
                "clientId": "CLIENT-001",
                "assetType": "AUTO",
                "assetValue": "25000"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["data"]["premium"], json!("500.00"));
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let fetched = server.get(&format!("/api/v1/quotes/{}", id)).await;
        fetched.assert_status_ok();
        let body: Value = fetched.json();
        assert_eq!(body["data"]["status"], json!("GENERATED"));
    }

    #[tokio::test]
    async fn test_unknown_asset_type_is_bad_request() {
        let server = quotation_server().await;

        let response = server
            .post("/api/v1/quotes")
            .json(&json!({
                "clientId": "CLIENT-001",
                "assetType": "BOAT",
                "assetValue": "25000"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_missing_quote_is_not_found() {
        let server = quotation_server().await;
        let id = core_kernel::QuoteId::new();
        let response = server.get(&format!("/api/v1/quotes/{}", id)).await;
        response.assert_status(axum::http::StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_second_convert_conflicts() {
        let server = quotation_server().await;

        let created = server
            .post("/api/v1/quotes")
            .json(&json!({
                "clientId": "CLIENT-001",
                "assetType": "HOME",
                "assetValue": "100000"
            }))
            .await;
        let body: Value = created.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let first = server
            .post(&format!("/api/v1/quotes/{}/convert", id))
            .await;
        first.assert_status_ok();
        let body: Value = first.json();
        assert_eq!(body["data"]["status"], json!("CONVERTED"));

        let second = server
            .post(&format!("/api/v1/quotes/{}/convert", id))
            .await;
        second.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_health_and_stats() {
        let server = quotation_server().await;
        server.get("/api/v1/quotation/health").await.assert_status_ok();

        let stats = server.get("/api/v1/quotation/stats").await;
        stats.assert_status_ok();
        let body: Value = stats.json();
        assert_eq!(body["data"]["total"], json!(0));
    }
}

mod subscription_api_tests {
    use super::*;

    fn issue_body() -> Value {
        json!({
            "quoteId": core_kernel::QuoteId::new().to_string(),
            "clientId": "CLIENT-001",
            "assetType": "AUTO",
            "premium": "500"
        })
    }

    #[tokio::test]
    async fn test_issue_contract() {
        let server = subscription_server().await;

        let response = server.post("/api/v1/contracts").json(&issue_body()).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["data"]["status"], json!("ACTIVE"));
    }

    #[tokio::test]
    async fn test_duplicate_issue_conflicts() {
        let server = subscription_server().await;
        let request = issue_body();

        server
            .post("/api/v1/contracts")
            .json(&request)
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        server
            .post("/api/v1/contracts")
            .json(&request)
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_terminate_with_unknown_reason_is_bad_request() {
        let server = subscription_server().await;

        let created = server.post("/api/v1/contracts").json(&issue_body()).await;
        let body: Value = created.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let response = server
            .post(&format!("/api/v1/contracts/{}/terminate", id))
            .json(&json!({"reason": "BOREDOM"}))
            .await;
        response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_modify_then_terminate() {
        let server = subscription_server().await;

        let created = server.post("/api/v1/contracts").json(&issue_body()).await;
        let body: Value = created.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let modified = server
            .put(&format!("/api/v1/contracts/{}/modify", id))
            .json(&json!({"change": "coverage", "newValue": {"deductible": 250}}))
            .await;
        modified.assert_status_ok();
        let body: Value = modified.json();
        assert_eq!(body["data"]["status"], json!("MODIFIED"));

        let terminated = server
            .post(&format!("/api/v1/contracts/{}/terminate", id))
            .json(&json!({"reason": "CLIENT_REQUEST"}))
            .await;
        terminated.assert_status_ok();
        let body: Value = terminated.json();
        assert_eq!(body["data"]["status"], json!("TERMINATED"));
    }
}

mod claims_api_tests {
    use super::*;

    fn declare_body() -> Value {
        json!({
            "contractId": core_kernel::ContractId::new().to_string(),
            "claimType": "THEFT",
            "description": "stolen bicycle",
            "estimatedAmount": "1200",
            "occurredAt": (Utc::now() - Duration::hours(4)).to_rfc3339()
        })
    }

    #[tokio::test]
    async fn test_declare_evaluate_indemnify() {
        let server = claims_server().await;

        let declared = server.post("/api/v1/claims").json(&declare_body()).await;
        declared.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = declared.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let evaluated = server
            .post(&format!("/api/v1/claims/{}/evaluate", id))
            .json(&json!({"assessedAmount": "1000"}))
            .await;
        evaluated.assert_status_ok();
        let body: Value = evaluated.json();
        assert_eq!(body["data"]["status"], json!("EVALUATED"));

        // The payout does not have to match the assessment.
        let paid = server
            .post(&format!("/api/v1/claims/{}/indemnify", id))
            .json(&json!({"indemnifiedAmount": "950"}))
            .await;
        paid.assert_status_ok();
        let body: Value = paid.json();
        assert_eq!(body["data"]["status"], json!("INDEMNIFIED"));
        assert_eq!(body["data"]["indemnifiedAmount"], json!("950"));
        assert_eq!(body["data"]["assessedAmount"], json!("1000"));
    }

    #[tokio::test]
    async fn test_indemnify_before_evaluate_conflicts() {
        let server = claims_server().await;

        let declared = server.post("/api/v1/claims").json(&declare_body()).await;
        let body: Value = declared.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/v1/claims/{}/indemnify", id))
            .json(&json!({"indemnifiedAmount": "1200"}))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_reject_closed_claim_conflicts() {
        let server = claims_server().await;

        let declared = server.post("/api/v1/claims").json(&declare_body()).await;
        let body: Value = declared.json();
        let id = body["data"]["id"].as_str().unwrap().to_string();

        server
            .post(&format!("/api/v1/claims/{}/reject", id))
            .await
            .assert_status_ok();
        server
            .post(&format!("/api/v1/claims/{}/reject", id))
            .await
            .assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_list_respects_pagination() {
        let server = claims_server().await;

        for _ in 0..3 {
            server
                .post("/api/v1/claims")
                .json(&declare_body())
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let listed = server
            .get("/api/v1/claims")
            .add_query_param("limit", 2)
            .await;
        listed.assert_status_ok();
        let body: Value = listed.json();
        assert_eq!(body["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_stats_reports_totals() {
        let server = claims_server().await;

        server
            .post("/api/v1/claims")
            .json(&declare_body())
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let stats = server.get("/api/v1/claims/stats").await;
        stats.assert_status_ok();
        let body: Value = stats.json();
        assert_eq!(body["data"]["total"], json!(1));
        assert_eq!(body["data"]["declared"], json!(1));
    }
}

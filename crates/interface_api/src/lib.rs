//! HTTP API Layer
//!
//! One Axum facade per bounded context. Each service binary builds its own
//! router over its domain service; all three share the same envelope,
//! error mapping, tracing and CORS setup.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{quotation_router, QuotationState};
//!
//! let app = quotation_router(QuotationState { pool, service });
//! axum::serve(listener, app).await?;
//! ```

pub mod bootstrap;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

use axum::extract::FromRef;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use domain_claims::ClaimsService;
use domain_quotation::QuotationService;
use domain_subscription::SubscriptionService;
use infra_db::DatabasePool;

use crate::handlers::{claims, health, quotation, subscription};

/// State for the quotation facade
#[derive(Clone)]
pub struct QuotationState {
    pub pool: DatabasePool,
    pub service: QuotationService,
}

impl FromRef<QuotationState> for DatabasePool {
    fn from_ref(state: &QuotationState) -> Self {
        state.pool.clone()
    }
}

/// State for the subscription facade
#[derive(Clone)]
pub struct SubscriptionState {
    pub pool: DatabasePool,
    pub service: SubscriptionService,
}

impl FromRef<SubscriptionState> for DatabasePool {
    fn from_ref(state: &SubscriptionState) -> Self {
        state.pool.clone()
    }
}

/// State for the claims facade
#[derive(Clone)]
pub struct ClaimsState {
    pub pool: DatabasePool,
    pub service: ClaimsService,
}

impl FromRef<ClaimsState> for DatabasePool {
    fn from_ref(state: &ClaimsState) -> Self {
        state.pool.clone()
    }
}

/// Builds the quotation service router
pub fn quotation_router(state: QuotationState) -> Router {
    let quote_routes = Router::new()
        .route("/", post(quotation::create_quote).get(quotation::list_quotes))
        .route("/:id", get(quotation::get_quote))
        .route("/:id/convert", post(quotation::convert_quote))
        .route("/client/:client_id", get(quotation::quotes_by_client));

    let context_routes = Router::new()
        .route("/stats", get(quotation::stats))
        .route("/health", get(health::health_check));

    Router::new()
        .nest("/api/v1/quotes", quote_routes)
        .nest("/api/v1/quotation", context_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Builds the subscription service router
pub fn subscription_router(state: SubscriptionState) -> Router {
    let contract_routes = Router::new()
        .route(
            "/",
            post(subscription::issue_contract).get(subscription::list_contracts),
        )
        .route("/:id", get(subscription::get_contract))
        .route("/:id/modify", put(subscription::modify_contract))
        .route("/:id/terminate", post(subscription::terminate_contract))
        .route("/client/:client_id", get(subscription::contracts_by_client));

    let context_routes = Router::new()
        .route("/stats", get(subscription::stats))
        .route("/health", get(health::health_check));

    Router::new()
        .nest("/api/v1/contracts", contract_routes)
        .nest("/api/v1/subscription", context_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Builds the claims service router
pub fn claims_router(state: ClaimsState) -> Router {
    let claim_routes = Router::new()
        .route("/", post(claims::declare_claim).get(claims::list_claims))
        .route("/:id", get(claims::get_claim))
        .route("/:id/evaluate", post(claims::evaluate_claim))
        .route("/:id/indemnify", post(claims::indemnify_claim))
        .route("/:id/reject", post(claims::reject_claim))
        .route("/contract/:contract_id", get(claims::claims_by_contract))
        .route("/stats", get(claims::stats))
        .route("/health", get(health::health_check));

    Router::new()
        .nest("/api/v1/claims", claim_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

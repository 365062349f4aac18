//! Subscription service binary
//!
//! # Environment Variables
//!
//! * `SUBSCRIPTION_HOST` - Server host (default: 0.0.0.0)
//! * `SUBSCRIPTION_PORT` - Server port (default: 8082)
//! * `SUBSCRIPTION_DATABASE_URL` - SQLite connection string
//! * `SUBSCRIPTION_BROKER_URL` - Redis broker URL (default: redis://127.0.0.1:6379)
//! * `SUBSCRIPTION_LOG_LEVEL` - Log level (default: info)
//! * `SUBSCRIPTION_AUTO_CONVERT_PROBABILITY` - Auto-conversion chance (default: 0.70)

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use domain_subscription::{QuoteGeneratedHandler, SubscriptionConfig, SubscriptionService};
use infra_db::{create_pool_from_url, init_schema, ContractRepository, EventLogRepository};
use infra_events::topics::TOPIC_QUOTE_GENERATED;
use infra_events::{EventPublisher, MemoryBus, RedisPublisher, RedisSubscriber};
use interface_api::bootstrap::{
    init_tracing, serve_until_shutdown, shutdown_channel, shutdown_signal, SHUTDOWN_GRACE,
};
use interface_api::config::ServiceConfig;
use interface_api::{subscription_router, SubscriptionState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::load(
        "SUBSCRIPTION",
        8082,
        "sqlite://data/subscription.db?mode=rwc",
        60,
    );
    init_tracing(&config.log_level);

    info!(host = %config.host, port = config.port, "Starting subscription service");

    let pool = create_pool_from_url(&config.database_url).await?;
    init_schema(&pool).await?;

    // A broker outage must not keep the service from starting; contracts
    // are still served, only the notifications go dark.
    let publisher: Arc<dyn EventPublisher> = match RedisPublisher::connect(&config.broker_url).await
    {
        Ok(publisher) => Arc::new(publisher),
        Err(e) => {
            warn!(error = %e, "Broker unavailable, events stay local");
            Arc::new(MemoryBus::new())
        }
    };

    let service = SubscriptionService::new(
        ContractRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        publisher,
    )
    .with_config(SubscriptionConfig {
        auto_convert_probability: config.auto_convert_probability,
    });

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    match RedisSubscriber::new(&config.broker_url) {
        Ok(subscriber) => {
            let subscriber = subscriber.on(
                TOPIC_QUOTE_GENERATED,
                Arc::new(QuoteGeneratedHandler::new(service.clone())),
            );
            tokio::spawn(async move {
                if let Err(e) = subscriber.run(shutdown_rx).await {
                    error!(error = %e, "Subscriber loop failed");
                }
            });
        }
        Err(e) => {
            warn!(error = %e, "Broker unavailable, automatic conversion disabled");
        }
    }

    let app = subscription_router(SubscriptionState { pool, service });

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Subscription service listening");

    serve_until_shutdown(listener, app, shutdown_signal(), SHUTDOWN_GRACE).await?;

    let _ = shutdown_tx.send(true);
    info!("Subscription service stopped");
    Ok(())
}

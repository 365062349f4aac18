//! Claims service binary
//!
//! # Environment Variables
//!
//! * `CLAIMS_HOST` - Server host (default: 0.0.0.0)
//! * `CLAIMS_PORT` - Server port (default: 8083)
//! * `CLAIMS_DATABASE_URL` - SQLite connection string
//! * `CLAIMS_BROKER_URL` - Redis broker URL (default: redis://127.0.0.1:6379)
//! * `CLAIMS_LOG_LEVEL` - Log level (default: info)
//! * `CLAIMS_SWEEP_INTERVAL_SECS` - Auto-processing interval (default: 30)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use domain_claims::{ClaimsConfig, ClaimsService, ContractIssuedHandler, ContractTerminatedHandler};
use infra_db::{create_pool_from_url, init_schema, ClaimRepository, EventLogRepository};
use infra_events::topics::{TOPIC_CONTRACT_ISSUED, TOPIC_CONTRACT_TERMINATED};
use infra_events::{EventPublisher, MemoryBus, RedisPublisher, RedisSubscriber};
use interface_api::bootstrap::{
    init_tracing, serve_until_shutdown, shutdown_channel, shutdown_signal, SHUTDOWN_GRACE,
};
use interface_api::config::ServiceConfig;
use interface_api::{claims_router, ClaimsState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::load("CLAIMS", 8083, "sqlite://data/claims.db?mode=rwc", 30);
    init_tracing(&config.log_level);

    info!(host = %config.host, port = config.port, "Starting claims service");

    let pool = create_pool_from_url(&config.database_url).await?;
    init_schema(&pool).await?;

    // A broker outage must not keep the service from starting; claims are
    // still served, only the notifications go dark.
    let publisher: Arc<dyn EventPublisher> = match RedisPublisher::connect(&config.broker_url).await
    {
        Ok(publisher) => Arc::new(publisher),
        Err(e) => {
            warn!(error = %e, "Broker unavailable, events stay local");
            Arc::new(MemoryBus::new())
        }
    };

    let service = ClaimsService::new(
        ClaimRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        publisher,
    )
    .with_config(ClaimsConfig {
        process_interval: Duration::from_secs(config.sweep_interval_secs),
        ..ClaimsConfig::default()
    });

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let sweep = service.clone();
    let sweep_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        sweep.run_auto_process(sweep_shutdown).await;
    });

    match RedisSubscriber::new(&config.broker_url) {
        Ok(subscriber) => {
            let subscriber = subscriber
                .on(TOPIC_CONTRACT_ISSUED, Arc::new(ContractIssuedHandler))
                .on(TOPIC_CONTRACT_TERMINATED, Arc::new(ContractTerminatedHandler));
            tokio::spawn(async move {
                if let Err(e) = subscriber.run(shutdown_rx).await {
                    error!(error = %e, "Subscriber loop failed");
                }
            });
        }
        Err(e) => {
            warn!(error = %e, "Broker unavailable, contract events not consumed");
        }
    }

    let app = claims_router(ClaimsState { pool, service });

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Claims service listening");

    serve_until_shutdown(listener, app, shutdown_signal(), SHUTDOWN_GRACE).await?;

    let _ = shutdown_tx.send(true);
    info!("Claims service stopped");
    Ok(())
}

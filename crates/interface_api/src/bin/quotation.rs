//! Quotation service binary
//!
//! # Environment Variables
//!
//! * `QUOTATION_HOST` - Server host (default: 0.0.0.0)
//! * `QUOTATION_PORT` - Server port (default: 8081)
//! * `QUOTATION_DATABASE_URL` - SQLite connection string
//! * `QUOTATION_BROKER_URL` - Redis broker URL (default: redis://127.0.0.1:6379)
//! * `QUOTATION_LOG_LEVEL` - Log level (default: info)
//! * `QUOTATION_SWEEP_INTERVAL_SECS` - Expiry sweep interval (default: 60)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};

use domain_quotation::{QuotationConfig, QuotationService};
use infra_db::{create_pool_from_url, init_schema, EventLogRepository, QuoteRepository};
use infra_events::{EventPublisher, MemoryBus, RedisPublisher};
use interface_api::bootstrap::{
    init_tracing, serve_until_shutdown, shutdown_channel, shutdown_signal, SHUTDOWN_GRACE,
};
use interface_api::config::ServiceConfig;
use interface_api::{quotation_router, QuotationState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServiceConfig::load("QUOTATION", 8081, "sqlite://data/quotation.db?mode=rwc", 60);
    init_tracing(&config.log_level);

    info!(host = %config.host, port = config.port, "Starting quotation service");

    let pool = create_pool_from_url(&config.database_url).await?;
    init_schema(&pool).await?;

    // A broker outage must not keep the service from starting; quotes are
    // still served, only the notifications go dark.
    let publisher: Arc<dyn EventPublisher> = match RedisPublisher::connect(&config.broker_url).await
    {
        Ok(publisher) => Arc::new(publisher),
        Err(e) => {
            warn!(error = %e, "Broker unavailable, events stay local");
            Arc::new(MemoryBus::new())
        }
    };

    let service = QuotationService::new(
        QuoteRepository::new(pool.clone()),
        EventLogRepository::new(pool.clone()),
        publisher,
    )
    .with_config(QuotationConfig {
        expiry_interval: Duration::from_secs(config.sweep_interval_secs),
    });

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let sweep = service.clone();
    tokio::spawn(async move {
        sweep.run_expiry_sweep(shutdown_rx).await;
    });

    let app = quotation_router(QuotationState { pool, service });

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Quotation service listening");

    serve_until_shutdown(listener, app, shutdown_signal(), SHUTDOWN_GRACE).await?;

    let _ = shutdown_tx.send(true);
    info!("Quotation service stopped");
    Ok(())
}

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use community_registry_api::app::{create_router, AppState, Stores};
use community_registry_api::config::Config;
use community_registry_api::jobs::{JobScheduler, PruneRateLimitJob};
use community_registry_api::middleware;
use domain::services::{Clock, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load().context("failed to load configuration")?;

    middleware::init_logging(&config.logging)?;
    if let Err(e) = middleware::init_metrics() {
        warn!(error = %e, "Prometheus exporter unavailable, /metrics will answer 503");
    }

    info!("Starting community registry v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let stores = if config.database.is_configured() {
        let db_config = persistence::db::DatabaseConfig::from(&config.database);
        let pool = persistence::db::create_pool(&db_config).await?;

        info!("Running database migrations...");
        persistence::db::run_migrations(&pool).await?;
        info!("Migrations completed");

        Stores::postgres(pool)
    } else {
        warn!("No database configured, using in-memory stores");
        Stores::in_memory(clock.clone())
    };

    let addr = config.socket_addr()?;
    let state = AppState::new(config, stores, clock);

    let mut scheduler = JobScheduler::new();
    scheduler.register(PruneRateLimitJob::new(state.rate_limiter.clone()));
    scheduler.start();

    let app = create_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(5)).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

//! Worker-Dispatcher - Entry Point
//!
//! Pulls requests off the shared queue, enforces the process-wide
//! parallelism ceiling, and runs the Aggregate-Producer (spec.md §4.2-§4.4).

use std::sync::Arc;

use aggregates::PostgresAggregateProducer;
use core_config::tracing::init_tracing;
use dispatch_core::{RedisCacheQueueBus, WorkerDispatcher};
use tracing::{error, info};

mod config;
mod health;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install().ok();
    core_config::load_dotenv();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    observability::init_metrics();
    info!("Prometheus metrics initialized");

    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;
    info!("Connected to PostgreSQL");

    info!("Connecting to Redis...");
    let manager = database::redis::connect_from_config_with_retry(config.redis.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?;
    let client = redis::Client::open(config.redis.url.as_str())?;
    info!("Connected to Redis");

    let health_state = health::HealthState {
        db: db.clone(),
        redis: manager.clone(),
    };

    let bus = Arc::new(RedisCacheQueueBus::new(manager, client));
    let producer = Arc::new(PostgresAggregateProducer::new(db));
    let dispatcher = WorkerDispatcher::new(bus, producer, config.dispatch);

    let health_port = config.health_port;
    tokio::spawn(async move {
        if let Err(error) = health::serve(health_port, health_state).await {
            error!(%error, "health server failed");
        }
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    info!("Starting dispatch loop");
    dispatcher.run(shutdown_rx).await;

    info!("Worker-Dispatcher shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

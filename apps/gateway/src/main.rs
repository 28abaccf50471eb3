//! Front-Gateway - Entry Point
//!
//! HTTP read-through cache over the warehouse aggregate dispatch core
//! (spec.md §4.1, §6).

use axum::{middleware, routing::get, Router};
use core_config::tracing::init_tracing;
use dispatch_core::{FrontGateway, RedisCacheQueueBus};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

mod api;
mod config;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install().ok();
    core_config::load_dotenv();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    observability::init_metrics();
    info!("Prometheus metrics initialized");

    let manager = database::redis::connect_from_config_with_retry(config.redis.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("Redis connection failed: {}", e))?;
    let client = redis::Client::open(config.redis.url.as_str())?;
    let health_manager = manager.clone();
    let bus = Arc::new(RedisCacheQueueBus::new(manager, client));

    let gateway = Arc::new(FrontGateway::new(bus, config.dispatch));
    let state = AppState {
        config: config.clone(),
        gateway,
        redis: health_manager,
    };

    let app: Router = api::routes(state)
        .layer(middleware::from_fn(observability::metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .route("/metrics", get(observability::metrics_handler));

    let addr = config.server.address();
    info!("Starting Front-Gateway on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Front-Gateway shutdown complete");
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining in-flight requests");
    tokio::time::sleep(Duration::from_millis(50)).await;
}

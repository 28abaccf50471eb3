//! Minimal liveness/readiness/metrics server for the Worker-Dispatcher.
//!
//! The worker has no inbound request path of its own (spec.md §4.2-§4.3 run
//! entirely off the shared queue), so this exists only for Kubernetes probes
//! and Prometheus scraping, same role as the teacher's tasks-worker health
//! server.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use database::postgres::DatabaseConnection;
use redis::aio::ConnectionManager;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Clone)]
pub struct HealthState {
    pub db: DatabaseConnection,
    pub redis: ConnectionManager,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "worker",
    })
}

/// Unlike `/health`, actually pings Postgres and Redis — the worker can't
/// make progress on the dispatch loop if either is down.
async fn ready(State(mut state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let postgres_ok = database::postgres::check_health(&state.db).await.is_ok();
    let redis_ok = database::redis::check_health(&mut state.redis).await.is_ok();

    if postgres_ok && redis_ok {
        (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                service: "worker",
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
                service: "worker",
            }),
        )
    }
}

pub async fn serve(port: u16, state: HealthState) -> eyre::Result<()> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(observability::metrics_handler))
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "worker health/metrics server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

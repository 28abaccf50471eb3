//! Liveness/readiness endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unlike `/health`, actually pings Redis — the gateway is not ready to
/// serve traffic if its cache/queue/bus connection is down.
async fn ready(State(mut state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    match database::redis::check_health(&mut state.redis).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready",
                service: "gateway",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
                service: "gateway",
                version: env!("CARGO_PKG_VERSION"),
            }),
        ),
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

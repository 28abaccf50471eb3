use std::sync::Arc;

use dispatch_core::FrontGateway;
use redis::aio::ConnectionManager;

use crate::config::Config;

/// Shared application state: the config (for health/ready checks), a handle
/// on the Front-Gateway itself, and a Redis connection for the readiness
/// probe. Cheap to clone — every field is `Arc`-backed or a cloneable
/// connection handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<FrontGateway>,
    pub redis: ConnectionManager,
}

pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    health::router(state.clone()).merge(products::router(state))
}

//! The two aggregate endpoints spec.md §6 names: `GET /products/bought` and
//! `GET /products/items/bought`. Both share the same dispatch call,
//! parameterized on `AggregateKind`, but shape their response rows
//! differently (`boughtProductsQuantity` vs `boughtItemsQuantity`); the
//! caller's principal travels in the `Token` header.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dispatch_core::{AggregateKind, DispatchError, ManufacturerCount};
use serde::Serialize;

use crate::state::AppState;

const TOKEN_HEADER: &str = "Token";

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// `products:bought`'s response shape (§3, §6): one row per manufacturer,
/// count under `boughtProductsQuantity`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProductsBoughtRow {
    manufacturer: String,
    bought_products_quantity: i64,
}

/// `items:bought`'s response shape: same row, count under
/// `boughtItemsQuantity`. A distinct type rather than a shared one with a
/// dynamic field name, since each `AggregateKind` owns its own response
/// shape per spec.md §3.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemsBoughtRow {
    manufacturer: String,
    bought_items_quantity: i64,
}

impl From<ManufacturerCount> for ProductsBoughtRow {
    fn from(row: ManufacturerCount) -> Self {
        Self {
            manufacturer: row.manufacturer,
            bought_products_quantity: row.count,
        }
    }
}

impl From<ManufacturerCount> for ItemsBoughtRow {
    fn from(row: ManufacturerCount) -> Self {
        Self {
            manufacturer: row.manufacturer,
            bought_items_quantity: row.count,
        }
    }
}

/// Maps the gateway's error taxonomy onto HTTP status codes, per spec.md §7:
/// `BadRequest` -> 400, `Throttled` -> 429, `Timeout`/`UpstreamFailure` -> 500.
impl IntoResponse for DispatchErrorResponse {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DispatchError::BadRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::Throttled => StatusCode::TOO_MANY_REQUESTS,
            DispatchError::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
            DispatchError::UpstreamFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // `BadRequest`'s inner string is the wire-facing message verbatim
        // (spec.md §6); `Display`'s "bad request: " prefix is for logs only.
        let message = match &self.0 {
            DispatchError::BadRequest(message) => message.clone(),
            other => other.to_string(),
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

struct DispatchErrorResponse(DispatchError);

impl From<DispatchError> for DispatchErrorResponse {
    fn from(error: DispatchError) -> Self {
        Self(error)
    }
}

fn principal_from(headers: &HeaderMap) -> String {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string()
}

async fn fetch(state: &AppState, headers: HeaderMap, kind: AggregateKind) -> Result<Vec<ManufacturerCount>, DispatchErrorResponse> {
    let principal = principal_from(&headers);
    let rows = state.gateway.fetch(kind, &principal).await?;
    Ok(rows)
}

async fn products_bought(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<ProductsBoughtRow>>, DispatchErrorResponse> {
    let rows = fetch(&state, headers, AggregateKind::ProductsBought).await?;
    Ok(Json(rows.into_iter().map(ProductsBoughtRow::from).collect()))
}

async fn items_bought(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Vec<ItemsBoughtRow>>, DispatchErrorResponse> {
    let rows = fetch(&state, headers, AggregateKind::ItemsBought).await?;
    Ok(Json(rows.into_iter().map(ItemsBoughtRow::from).collect()))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/products/bought", get(products_bought))
        .route("/products/items/bought", get(items_bought))
        .with_state(state)
}

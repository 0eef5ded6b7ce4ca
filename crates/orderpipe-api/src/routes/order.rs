//! Order lookup endpoint.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use orderpipe_core::model::Order;
use orderpipe_pipeline::read;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// Response envelope for a successful lookup.
#[derive(Debug, Serialize)]
pub struct OrderEnvelope {
    /// The requested order.
    pub order: Order,
}

/// GET /order/{order_uid}
async fn get_order(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Json<OrderEnvelope>, ApiError> {
    let order = read::get_order(
        &order_uid,
        state.cache.as_ref(),
        state.repository.as_ref(),
    )
    .await?;
    Ok(Json(OrderEnvelope { order }))
}

/// Returns the order lookup router.
pub fn router() -> Router<AppState> {
    Router::new().route("/order/{order_uid}", get(get_order))
}

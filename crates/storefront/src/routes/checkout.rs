//! Order submission handler.

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Serialize;

use libaas_core::OrderNumber;

use crate::error::Result;
use crate::middleware::Identity;
use crate::services::checkout::{OrderSubmission, place_order};
use crate::state::AppState;

/// Create-order acknowledgement.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order_number: OrderNumber,
}

/// Submit the cart and shipping form as a new order.
pub async fn create(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(submission): Json<OrderSubmission>,
) -> Result<Json<CreateOrderResponse>> {
    let order_number = place_order(state.sanity(), &user, &submission, Utc::now()).await?;

    Ok(Json(CreateOrderResponse { order_number }))
}

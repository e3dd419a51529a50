//! Order cancellation and order history handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use libaas_core::{OrderId, SubjectId};

use crate::error::{AppError, Result};
use crate::middleware::{Identity, bearer_token};
use crate::models::Order;
use crate::services::history::OrderHistory;
use crate::services::orders::{CancelRequest, cancel_order};
use crate::state::AppState;

/// Cancel request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderBody {
    pub order_id: OrderId,
    pub user_id: SubjectId,
}

/// Cancel acknowledgement.
#[derive(Debug, Serialize)]
pub struct CancelOrderResponse {
    pub success: bool,
}

/// Cancel an order.
///
/// The token is handed to the service untouched: the full precondition chain
/// (credential, identity match, ownership, policy) runs server-side in one
/// place, whatever the UI believed.
pub async fn cancel(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CancelOrderBody>,
) -> Result<Json<CancelOrderResponse>> {
    let token = bearer_token(&headers).ok_or_else(|| {
        AppError::Unauthenticated("Missing or invalid authorization header".to_owned())
    })?;

    let request = CancelRequest {
        order_id: body.order_id,
        user_id: body.user_id,
    };

    cancel_order(state.sanity(), state.supabase(), token, &request, Utc::now()).await?;

    Ok(Json(CancelOrderResponse { success: true }))
}

/// History query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    /// Substring search over order number and shipping name.
    pub q: Option<String>,
}

/// One order in the history response, with its cancel affordance.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    #[serde(flatten)]
    pub order: Order,
    pub can_cancel: bool,
}

/// History response.
#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderEntry>,
}

/// List the caller's recent orders.
pub async fn index(
    State(state): State<AppState>,
    Identity(user): Identity,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<OrdersResponse>> {
    let now = Utc::now();

    let customer = state
        .sanity()
        .lookup_user_ref(&user.subject)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_owned()))?;

    let history = OrderHistory::load(state.sanity(), &customer, now).await?;

    let orders = history
        .search(query.q.as_deref().unwrap_or(""))
        .into_iter()
        .map(|order| OrderEntry {
            can_cancel: OrderHistory::can_cancel(order, now),
            order: order.clone(),
        })
        .collect();

    Ok(Json(OrdersResponse { orders }))
}

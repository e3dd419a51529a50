//! Order history: the listing component behind `GET /orders`.
//!
//! Holds the fetched orders in memory, answers substring searches, derives
//! the cancel affordance, and hosts the one-shot refresh-and-retry around
//! cancellation.

use std::time::Duration;

use chrono::{DateTime, Utc};

use libaas_core::policy::is_cancellable;
use libaas_core::{OrderId, OrderStatus, UserRef};

use super::orders::{CancelOrderError, CancelRequest, cancel_order};
use super::{ContentStore, IdentityProvider};
use crate::models::Order;
use crate::sanity::StoreError;
use crate::supabase::IdentitySession;

/// Trailing window of order history shown to customers.
///
/// Policy constant - the single place the window is defined.
pub const ORDER_HISTORY_WINDOW: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// A customer's recent orders, newest first.
pub struct OrderHistory {
    orders: Vec<Order>,
}

impl OrderHistory {
    /// Fetch the customer's orders from the trailing history window.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails.
    pub async fn load<S: ContentStore>(
        store: &S,
        customer: &UserRef,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let since = now - ORDER_HISTORY_WINDOW;
        let orders = store.orders_since(customer, since).await?;
        Ok(Self { orders })
    }

    /// All loaded orders, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Orders matching a case-insensitive substring of the order number or
    /// the shipping recipient's name. An empty term matches everything.
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Order> {
        let needle = term.trim().to_lowercase();
        self.orders
            .iter()
            .filter(|order| {
                needle.is_empty()
                    || order
                        .order_number
                        .as_str()
                        .to_lowercase()
                        .contains(&needle)
                    || order
                        .shipping_info
                        .full_name
                        .to_lowercase()
                        .contains(&needle)
            })
            .collect()
    }

    /// Whether the cancel affordance should be shown for an order.
    ///
    /// A display decision only - the cancel endpoint re-checks
    /// authoritatively.
    #[must_use]
    pub fn can_cancel(order: &Order, now: DateTime<Utc>) -> bool {
        is_cancellable(order.status, order.created_at, now)
    }

    /// Cancel one of the loaded orders with the caller's session.
    ///
    /// If the first attempt fails because the credential is no longer valid,
    /// exactly one silent refresh is attempted and the whole operation
    /// retried once; a second failure is surfaced. Bounded to one attempt so
    /// a persistently broken session is not papered over.
    ///
    /// On success the local copy is updated in place - no refetch.
    ///
    /// # Errors
    ///
    /// See [`CancelOrderError`].
    pub async fn cancel<S, P>(
        &mut self,
        store: &S,
        identity: &P,
        session: &mut IdentitySession,
        order_id: &OrderId,
        now: DateTime<Utc>,
    ) -> Result<(), CancelOrderError>
    where
        S: ContentStore,
        P: IdentityProvider,
    {
        let request = CancelRequest {
            order_id: order_id.clone(),
            user_id: session.user.subject.clone(),
        };

        let first = cancel_order(store, identity, &session.access_token, &request, now).await;
        match first {
            Err(CancelOrderError::Unauthenticated(_)) => {
                let refreshed = identity
                    .refresh_session(&session.refresh_token)
                    .await
                    .map_err(CancelOrderError::Unauthenticated)?;
                *session = refreshed;

                let request = CancelRequest {
                    order_id: order_id.clone(),
                    user_id: session.user.subject.clone(),
                };
                cancel_order(store, identity, &session.access_token, &request, now).await?;
            }
            other => other?,
        }

        // Mirror the outcome locally rather than refetching the list
        if let Some(order) = self.orders.iter_mut().find(|order| &order.id == order_id) {
            order.status = OrderStatus::Cancelled;
        }

        Ok(())
    }
}

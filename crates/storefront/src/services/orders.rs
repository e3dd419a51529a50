//! Order cancellation: the precondition chain and the status write.
//!
//! The checks run server-side, in a fixed order, each with its own failure.
//! Whatever the listing UI showed, this chain is the authority.

use chrono::{DateTime, Utc};
use thiserror::Error;

use libaas_core::policy::{self, CancelDenied};
use libaas_core::{OrderId, OrderStatus, SubjectId};

use super::{ContentStore, IdentityProvider};
use crate::sanity::StoreError;
use crate::supabase::IdentityError;

/// A cancel request as received from the client.
#[derive(Debug, Clone)]
pub struct CancelRequest {
    /// Store document id of the order.
    pub order_id: OrderId,
    /// The subject the client claims to be. Must match the credential.
    pub user_id: SubjectId,
}

/// Everything that can stop a cancellation.
#[derive(Debug, Error)]
pub enum CancelOrderError {
    /// The bearer credential is missing, invalid, or expired.
    #[error("authentication failed: {0}")]
    Unauthenticated(#[source] IdentityError),

    /// The identity provider itself failed (transport, protocol).
    #[error("identity provider error: {0}")]
    Identity(#[source] IdentityError),

    /// The claimed user id does not match the credential's subject.
    #[error("user id does not match the authenticated user")]
    IdentityMismatch,

    /// The credential's subject has no user document in the store.
    #[error("user profile not found")]
    UserNotFound,

    /// The order does not exist - or belongs to someone else; the two cases
    /// are reported identically.
    #[error("order not found")]
    OrderNotFound,

    /// The policy said no.
    #[error(transparent)]
    NotCancellable(CancelDenied),

    /// The store read or write failed.
    #[error("content store error: {0}")]
    Store(#[from] StoreError),
}

/// Cancel an order on behalf of the bearer of `access_token`.
///
/// Preconditions run in order; the first failure wins:
/// 1. the credential must verify (`Unauthenticated`),
/// 2. the credential subject must equal `request.user_id`
///    (`IdentityMismatch` - a forged payload with someone else's id fails
///    here even though the token itself is fine),
/// 3. the subject must resolve to a user document (`UserNotFound`),
/// 4. the order must exist and belong to that user (`OrderNotFound`),
/// 5. the cancellation policy must allow it (`NotCancellable`).
///
/// On success exactly one field changes: `status` becomes `cancelled`.
/// Cancelling twice is an error, not a no-op - the second call dies at
/// precondition 5.
///
/// # Errors
///
/// See [`CancelOrderError`].
pub async fn cancel_order<S, P>(
    store: &S,
    identity: &P,
    access_token: &str,
    request: &CancelRequest,
    now: DateTime<Utc>,
) -> Result<(), CancelOrderError>
where
    S: ContentStore,
    P: IdentityProvider,
{
    let user = identity.verify_token(access_token).await.map_err(|e| {
        if e.is_auth_failure() {
            CancelOrderError::Unauthenticated(e)
        } else {
            CancelOrderError::Identity(e)
        }
    })?;

    if user.subject != request.user_id {
        return Err(CancelOrderError::IdentityMismatch);
    }

    let customer = store
        .find_user_ref(&user.subject)
        .await?
        .ok_or(CancelOrderError::UserNotFound)?;

    let order = store
        .order_for_cancel(&request.order_id, &customer)
        .await?
        .ok_or(CancelOrderError::OrderNotFound)?;

    policy::check_cancellable(order.status, order.created_at, now)
        .map_err(CancelOrderError::NotCancellable)?;

    store
        .set_order_status(&request.order_id, OrderStatus::Cancelled)
        .await?;

    tracing::info!(order_id = %request.order_id, "order cancelled");
    Ok(())
}

//! Application services: the flows between the HTTP surface and the two
//! external collaborators.
//!
//! Services are generic over narrow [`ContentStore`] / [`IdentityProvider`]
//! traits. Production wires in [`SanityClient`] and [`SupabaseClient`]; tests
//! wire in the in-memory doubles from [`testing`].

pub mod checkout;
pub mod history;
pub mod orders;
pub mod profile;

use std::collections::HashMap;
use std::future::Future;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use libaas_core::{Email, OrderId, OrderStatus, ProductId, SubjectId, UserRef};

use crate::models::{NewOrder, Order, OrderSnapshot, ProfileUpdate, User};
use crate::sanity::{SanityClient, StoreError};
use crate::supabase::{AuthenticatedUser, IdentityError, IdentitySession, SupabaseClient};

/// The slice of the content store the services depend on.
pub trait ContentStore: Send + Sync {
    /// Resolve the store document id for an identity-provider subject.
    fn find_user_ref(
        &self,
        subject: &SubjectId,
    ) -> impl Future<Output = Result<Option<UserRef>, StoreError>> + Send;

    /// Fetch the full user document for a subject.
    fn fetch_user(
        &self,
        subject: &SubjectId,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Patch the user document for a subject, creating it if absent.
    fn upsert_user(
        &self,
        subject: &SubjectId,
        email: &Email,
        update: &ProfileUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Fetch the cancellation snapshot of an order owned by `customer`.
    /// Absent and not-owned are indistinguishable by contract.
    fn order_for_cancel(
        &self,
        order_id: &OrderId,
        customer: &UserRef,
    ) -> impl Future<Output = Result<Option<OrderSnapshot>, StoreError>> + Send;

    /// Overwrite an order's status as a single atomic field update.
    fn set_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Persist a new order document.
    fn create_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// A customer's orders created on or after `since`, newest first.
    fn orders_since(
        &self,
        customer: &UserRef,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Order>, StoreError>> + Send;

    /// Current catalog prices for a set of products; unknown ids are absent.
    fn product_prices(
        &self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<HashMap<ProductId, Decimal>, StoreError>> + Send;
}

impl ContentStore for SanityClient {
    async fn find_user_ref(&self, subject: &SubjectId) -> Result<Option<UserRef>, StoreError> {
        self.lookup_user_ref(subject).await
    }

    async fn fetch_user(&self, subject: &SubjectId) -> Result<Option<User>, StoreError> {
        self.user_by_subject(subject).await
    }

    async fn upsert_user(
        &self,
        subject: &SubjectId,
        email: &Email,
        update: &ProfileUpdate,
    ) -> Result<(), StoreError> {
        self.upsert_profile(subject, email, update).await
    }

    async fn order_for_cancel(
        &self,
        order_id: &OrderId,
        customer: &UserRef,
    ) -> Result<Option<OrderSnapshot>, StoreError> {
        self.order_for_cancellation(order_id, customer).await
    }

    async fn set_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        self.write_order_status(order_id, status).await
    }

    async fn create_order(&self, order: &NewOrder) -> Result<(), StoreError> {
        self.insert_order(order).await
    }

    async fn orders_since(
        &self,
        customer: &UserRef,
        since: DateTime<Utc>,
    ) -> Result<Vec<Order>, StoreError> {
        self.orders_created_since(customer, since).await
    }

    async fn product_prices(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
        self.prices_for(ids).await
    }
}

/// The slice of the identity provider the services depend on.
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer access token.
    fn verify_token(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<AuthenticatedUser, IdentityError>> + Send;

    /// Exchange a refresh token for a fresh session.
    fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<IdentitySession, IdentityError>> + Send;
}

impl IdentityProvider for SupabaseClient {
    async fn verify_token(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError> {
        self.verify_access_token(access_token).await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<IdentitySession, IdentityError> {
        self.refresh_access_token(refresh_token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! In-memory doubles for the store and identity seams.

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// An in-memory content store backed by plain collections.
    #[derive(Default)]
    pub struct MemoryStore {
        users: Mutex<HashMap<SubjectId, User>>,
        orders: Mutex<Vec<(UserRef, Order)>>,
        prices: Mutex<HashMap<ProductId, Decimal>>,
        pub created: Mutex<Vec<NewOrder>>,
        pub order_fetches: AtomicUsize,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn add_user(&self, subject: &SubjectId, user_ref: &UserRef, email: &str) {
            self.users.lock().unwrap().insert(
                subject.clone(),
                User {
                    id: user_ref.clone(),
                    supabase_id: subject.clone(),
                    email: Email::parse(email).unwrap(),
                    full_name: None,
                    phone_number: None,
                    address: None,
                },
            );
        }

        pub fn add_order(&self, customer: &UserRef, order: Order) {
            self.orders.lock().unwrap().push((customer.clone(), order));
        }

        pub fn set_price(&self, id: &ProductId, price: Decimal) {
            self.prices.lock().unwrap().insert(id.clone(), price);
        }

        pub fn order_status(&self, order_id: &OrderId) -> Option<OrderStatus> {
            self.orders
                .lock()
                .unwrap()
                .iter()
                .find(|(_, order)| &order.id == order_id)
                .map(|(_, order)| order.status)
        }

        pub fn stored_profile(&self, subject: &SubjectId) -> Option<User> {
            self.users.lock().unwrap().get(subject).cloned()
        }
    }

    impl ContentStore for MemoryStore {
        async fn find_user_ref(&self, subject: &SubjectId) -> Result<Option<UserRef>, StoreError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .get(subject)
                .map(|user| user.id.clone()))
        }

        async fn fetch_user(&self, subject: &SubjectId) -> Result<Option<User>, StoreError> {
            Ok(self.users.lock().unwrap().get(subject).cloned())
        }

        async fn upsert_user(
            &self,
            subject: &SubjectId,
            email: &Email,
            update: &ProfileUpdate,
        ) -> Result<(), StoreError> {
            let mut users = self.users.lock().unwrap();
            let user = users.entry(subject.clone()).or_insert_with(|| User {
                id: UserRef::new(format!("user-{subject}")),
                supabase_id: subject.clone(),
                email: email.clone(),
                full_name: None,
                phone_number: None,
                address: None,
            });
            user.full_name = update.full_name.clone();
            user.phone_number = update.phone_number.clone();
            user.address = update.address.clone();
            Ok(())
        }

        async fn order_for_cancel(
            &self,
            order_id: &OrderId,
            customer: &UserRef,
        ) -> Result<Option<OrderSnapshot>, StoreError> {
            Ok(self
                .orders
                .lock()
                .unwrap()
                .iter()
                .find(|(owner, order)| owner == customer && &order.id == order_id)
                .map(|(_, order)| OrderSnapshot {
                    id: order.id.clone(),
                    created_at: order.created_at,
                    status: order.status,
                }))
        }

        async fn set_order_status(
            &self,
            order_id: &OrderId,
            status: OrderStatus,
        ) -> Result<(), StoreError> {
            let mut orders = self.orders.lock().unwrap();
            if let Some((_, order)) = orders.iter_mut().find(|(_, order)| &order.id == order_id) {
                order.status = status;
            }
            Ok(())
        }

        async fn create_order(&self, order: &NewOrder) -> Result<(), StoreError> {
            self.created.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn orders_since(
            &self,
            customer: &UserRef,
            since: DateTime<Utc>,
        ) -> Result<Vec<Order>, StoreError> {
            self.order_fetches.fetch_add(1, Ordering::SeqCst);
            let mut orders: Vec<Order> = self
                .orders
                .lock()
                .unwrap()
                .iter()
                .filter(|(owner, order)| owner == customer && order.created_at >= since)
                .map(|(_, order)| order.clone())
                .collect();
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(orders)
        }

        async fn product_prices(
            &self,
            ids: &[ProductId],
        ) -> Result<HashMap<ProductId, Decimal>, StoreError> {
            let prices = self.prices.lock().unwrap();
            Ok(ids
                .iter()
                .filter_map(|id| prices.get(id).map(|price| (id.clone(), *price)))
                .collect())
        }
    }

    /// An in-memory identity provider with scriptable tokens.
    #[derive(Default)]
    pub struct MemoryIdentity {
        valid: Mutex<HashMap<String, AuthenticatedUser>>,
        expired: Mutex<HashSet<String>>,
        refreshable: Mutex<HashMap<String, IdentitySession>>,
        pub verify_calls: AtomicUsize,
        pub refresh_calls: AtomicUsize,
    }

    impl MemoryIdentity {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(subject: &str, email: &str) -> AuthenticatedUser {
            AuthenticatedUser {
                subject: SubjectId::new(subject),
                email: Email::parse(email).unwrap(),
            }
        }

        pub fn grant(&self, access_token: &str, user: AuthenticatedUser) {
            self.valid
                .lock()
                .unwrap()
                .insert(access_token.to_owned(), user);
        }

        pub fn expire(&self, access_token: &str) {
            self.valid.lock().unwrap().remove(access_token);
            self.expired.lock().unwrap().insert(access_token.to_owned());
        }

        /// Make `refresh_token` redeemable for a new session carrying
        /// `access_token`, which becomes valid on redemption.
        pub fn allow_refresh(&self, refresh_token: &str, access_token: &str, user: AuthenticatedUser) {
            self.refreshable.lock().unwrap().insert(
                refresh_token.to_owned(),
                IdentitySession {
                    access_token: access_token.to_owned(),
                    refresh_token: format!("{refresh_token}-next"),
                    user,
                },
            );
        }
    }

    impl IdentityProvider for MemoryIdentity {
        async fn verify_token(&self, access_token: &str) -> Result<AuthenticatedUser, IdentityError> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(user) = self.valid.lock().unwrap().get(access_token) {
                return Ok(user.clone());
            }
            if self.expired.lock().unwrap().contains(access_token) {
                return Err(IdentityError::TokenExpired);
            }
            Err(IdentityError::InvalidToken("unknown token".to_owned()))
        }

        async fn refresh_session(&self, refresh_token: &str) -> Result<IdentitySession, IdentityError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            let session = self
                .refreshable
                .lock()
                .unwrap()
                .get(refresh_token)
                .cloned()
                .ok_or_else(|| IdentityError::InvalidToken("invalid refresh token".to_owned()))?;
            self.grant(&session.access_token, session.user.clone());
            Ok(session)
        }
    }
}

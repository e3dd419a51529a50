//! Profile surface: fetch and upsert the customer's user document.

use serde::Serialize;

use libaas_core::Email;

use super::ContentStore;
use crate::models::{Address, ProfileUpdate};
use crate::sanity::StoreError;
use crate::supabase::AuthenticatedUser;

/// What the profile page renders.
///
/// `is_admin` only decides whether the admin menu is shown; it is not an
/// authorization boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub email: Email,
    pub full_name: String,
    pub phone_number: String,
    pub address: Address,
    pub is_admin: bool,
}

/// Load the customer's profile, falling back to blanks when no user document
/// exists yet.
///
/// # Errors
///
/// Returns `StoreError` if the store query fails.
pub async fn load_profile<S: ContentStore>(
    store: &S,
    customer: &AuthenticatedUser,
    admin_email: Option<&Email>,
) -> Result<ProfileView, StoreError> {
    let stored = store.fetch_user(&customer.subject).await?;

    let is_admin = admin_email.is_some_and(|admin| customer.email.matches_ignore_case(admin));

    Ok(stored.map_or_else(
        || ProfileView {
            email: customer.email.clone(),
            full_name: String::new(),
            phone_number: String::new(),
            address: Address::default(),
            is_admin,
        },
        |user| ProfileView {
            email: user.email,
            full_name: user.full_name.unwrap_or_default(),
            phone_number: user.phone_number.unwrap_or_default(),
            address: user.address.unwrap_or_default(),
            is_admin,
        },
    ))
}

/// Save the editable profile fields, creating the user document on first
/// save. `supabaseId` and the email stay as they were.
///
/// # Errors
///
/// Returns `StoreError` if the store mutation fails.
pub async fn save_profile<S: ContentStore>(
    store: &S,
    customer: &AuthenticatedUser,
    update: &ProfileUpdate,
) -> Result<(), StoreError> {
    store
        .upsert_user(&customer.subject, &customer.email, update)
        .await
}

//! Profile handlers.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::Identity;
use crate::models::ProfileUpdate;
use crate::services::profile::{ProfileView, load_profile, save_profile};
use crate::state::AppState;

/// Save acknowledgement.
#[derive(Debug, Serialize)]
pub struct SaveProfileResponse {
    pub success: bool,
}

/// Show the caller's profile, with the admin-menu visibility flag.
pub async fn show(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Result<Json<ProfileView>> {
    let profile = load_profile(
        state.sanity(),
        &user,
        state.config().admin_email.as_ref(),
    )
    .await?;

    Ok(Json(profile))
}

/// Upsert the caller's editable profile fields.
pub async fn update(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<SaveProfileResponse>> {
    save_profile(state.sanity(), &user, &update).await?;

    Ok(Json(SaveProfileResponse { success: true }))
}

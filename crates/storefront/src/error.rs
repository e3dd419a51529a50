//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use libaas_core::policy::CancelDenied;

use crate::sanity::StoreError;
use crate::services::checkout::{PlaceOrderError, ValidationErrors};
use crate::services::orders::CancelOrderError;
use crate::supabase::IdentityError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Content store operation failed.
    #[error("content store error: {0}")]
    Store(#[from] StoreError),

    /// Identity provider failed (transport or protocol, not a bad credential).
    #[error("identity provider error: {0}")]
    Identity(IdentityError),

    /// The caller presented no usable credential.
    #[error("unauthorized: {0}")]
    Unauthenticated(String),

    /// Credential is fine but the payload claims a different user.
    #[error("user id mismatch")]
    IdentityMismatch,

    /// Resource not found (or not the caller's to see - reported identically).
    #[error("not found: {0}")]
    NotFound(String),

    /// The cancellation policy said no.
    #[error(transparent)]
    NotCancellable(CancelDenied),

    /// Field-level validation failures.
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// Bad request from client.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Classify an identity-provider failure: credential problems are the
    /// caller's fault, everything else is ours.
    #[must_use]
    pub fn from_identity(error: IdentityError) -> Self {
        if error.is_auth_failure() {
            Self::Unauthenticated("Invalid or expired token".to_owned())
        } else {
            Self::Identity(error)
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(error: IdentityError) -> Self {
        Self::from_identity(error)
    }
}

impl From<CancelOrderError> for AppError {
    fn from(error: CancelOrderError) -> Self {
        match error {
            CancelOrderError::Unauthenticated(_) => {
                Self::Unauthenticated("Invalid or expired token".to_owned())
            }
            CancelOrderError::Identity(e) => Self::Identity(e),
            CancelOrderError::IdentityMismatch => Self::IdentityMismatch,
            CancelOrderError::UserNotFound => Self::NotFound("User not found".to_owned()),
            // Existence and ownership are reported identically
            CancelOrderError::OrderNotFound => {
                Self::NotFound("Order not found or unauthorized".to_owned())
            }
            CancelOrderError::NotCancellable(denied) => Self::NotCancellable(denied),
            CancelOrderError::Store(e) => Self::Store(e),
        }
    }
}

impl From<PlaceOrderError> for AppError {
    fn from(error: PlaceOrderError) -> Self {
        match error {
            PlaceOrderError::IdentityMismatch => Self::IdentityMismatch,
            PlaceOrderError::UserNotFound => Self::NotFound("User not found".to_owned()),
            PlaceOrderError::EmptyCart => Self::BadRequest("Cart is empty".to_owned()),
            PlaceOrderError::Invalid(errors) => Self::Validation(errors),
            PlaceOrderError::UnknownProduct(id) => {
                Self::BadRequest(format!("Unknown product in cart: {id}"))
            }
            PlaceOrderError::TotalMismatch { expected } => Self::BadRequest(format!(
                "Order total does not match current prices (expected {expected})"
            )),
            PlaceOrderError::Store(e) => Self::Store(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server-side failures to Sentry
        if matches!(self, Self::Store(_) | Self::Identity(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Store(_) | Self::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::IdentityMismatch => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::NotCancellable(_) | Self::Validation(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        };

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Store(_) => serde_json::json!({ "error": "Failed to update order status" }),
            Self::Identity(_) => serde_json::json!({ "error": "Authentication service error" }),
            Self::IdentityMismatch => serde_json::json!({ "error": "User ID mismatch" }),
            Self::Validation(errors) => serde_json::json!({
                "error": "Validation failed",
                "fields": errors,
            }),
            Self::Unauthenticated(message)
            | Self::NotFound(message)
            | Self::BadRequest(message) => serde_json::json!({ "error": message }),
            Self::NotCancellable(denied) => serde_json::json!({ "error": denied.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (pings the content store)
//!
//! # Catalog (public)
//! GET  /products               - Product listing (category/price filters, sort)
//! GET  /products/{id}          - Product detail
//!
//! # Orders (bearer auth)
//! POST /create-order           - Submit the cart as a new order
//! POST /cancel-order           - Cancel an open order inside the window
//! GET  /orders                 - Order history (90 days, ?q= substring search)
//!
//! # Profile (bearer auth)
//! GET  /profile                - Profile plus the admin-menu flag
//! PUT  /profile                - Upsert the editable profile fields
//! ```

pub mod checkout;
pub mod orders;
pub mod products;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Order lifecycle
        .route("/create-order", post(checkout::create))
        .route("/cancel-order", post(orders::cancel))
        .route("/orders", get(orders::index))
        // Profile
        .route("/profile", get(profile::show).put(profile::update))
        // Catalog
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
}

//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Catalog
//! GET  /api/products           - Catalog rows (JSON array)
//!
//! # Payments
//! GET  /api/config             - Publishable key and store currency
//! POST /api/payment-intents    - Create a payment intent, returns clientSecret
//! ```
//!
//! Every `/api` route answers CORS preflight requests for any origin.

pub mod health;
pub mod payments;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/config", get(payments::public_config))
        .route("/payment-intents", post(payments::create_intent))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
}

//! HTTP route handlers for the checkout page.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                  - Checkout page
//! POST /checkout          - Submit the draft (303 / HX-Redirect to Mercado Pago)
//! POST /checkout/preview  - Update the draft, return submit controls (HTMX fragment)
//! GET  /health            - Liveness check
//! GET  /static/*          - Stylesheets
//! ```

pub mod checkout;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::rate_limit::RateLimiterLayer;
use crate::state::AppState;

/// Create the checkout routes router.
///
/// `limiter`, when given, applies to checkout creation only.
pub fn checkout_routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    let submit = post(checkout::submit);
    let submit = match limiter {
        Some(layer) => submit.route_layer(layer),
        None => submit,
    };

    Router::new()
        .route("/", submit)
        .route("/preview", post(checkout::preview))
}

/// Create all routes for the checkout page.
pub fn routes(limiter: Option<RateLimiterLayer>) -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::page))
        .route("/health", get(health))
        .nest("/checkout", checkout_routes(limiter))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the provider.
async fn health() -> &'static str {
    "ok"
}

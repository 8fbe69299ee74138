//! Web server module for receiving webhooks.
//!
//! This module provides a small HTTP front-end that:
//! - Receives GitHub push deliveries
//! - Accepts platform-style invocation events
//! - Hands both to the relay and returns its response
//!
//! Signature verification lives in [`signature`].

pub mod handlers;
pub mod signature;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use handlers::{github_webhook, health, invoke, AppState, HealthResponse};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};

/// Largest request body accepted.
///
/// GitHub caps deliveries at 25 MB; the rest is headroom for the escaped
/// body inside an `/invoke` event.
pub const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhooks/github", post(github_webhook))
        .route("/invoke", post(invoke))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

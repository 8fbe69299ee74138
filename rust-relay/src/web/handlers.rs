//! Webhook endpoint handlers.
//!
//! The handlers only translate between HTTP and the relay:
//! 1. Collect the raw body and headers
//! 2. Run the relay
//! 3. Return its response unchanged
//!
//! Deliveries the relay cannot answer become a generic 500.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::relay::{InboundEvent, ProxyResponse, Relay, RelayError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(relay: Relay) -> Self {
        Self {
            relay: Arc::new(relay),
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// GitHub Webhook
// =============================================================================

/// Body returned when the relay fails outright.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub message: &'static str,
}

fn internal_error(e: &RelayError) -> Response {
    error!(error = %e, "relay_unhandled_error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: "Internal server error",
        }),
    )
        .into_response()
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = (status, self.body).into_response();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                response.headers_mut().insert(name, value);
            }
        }

        response
    }
}

/// GitHub push webhook endpoint.
///
/// The body is taken as a string so the signature is checked against the
/// exact bytes GitHub sent.
pub async fn github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    info!(
        event = headers.get("x-github-event").map(String::as_str).unwrap_or("unknown"),
        delivery = headers.get("x-github-delivery").map(String::as_str).unwrap_or("unknown"),
        body_length = body.len(),
        "github_webhook_received"
    );

    let event = InboundEvent::new(body, headers);

    match state.relay.handle(&event).await {
        Ok(response) => response.into_response(),
        Err(e) => internal_error(&e),
    }
}

// =============================================================================
// Platform Invocation
// =============================================================================

/// Platform-style invocation endpoint.
///
/// Accepts a serialized [`InboundEvent`] and answers with the
/// [`ProxyResponse`] object itself, letting an API gateway in front of the
/// relay apply it.
pub async fn invoke(State(state): State<AppState>, Json(event): Json<InboundEvent>) -> Response {
    info!(
        header_count = event.headers.len(),
        body_length = event.body.len(),
        "invoke_received"
    );

    match state.relay.handle(&event).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => internal_error(&e),
    }
}

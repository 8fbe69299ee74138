//! Webhook relay - core request handling.
//!
//! Each delivery walks a fixed decision path and ends in exactly one response:
//!
//! ```text
//! verify signature → parse payload → ping? / deleted? → dispatch → (notify on failure)
//! ```

pub mod types;

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::github::{ClassifyError, Dispatcher, PushEvent, PushPayload};
use crate::notify::{FailureReport, Mailgun, Notifier};
use crate::web::signature::{verify_signature, SIGNATURE_HEADER};

pub use types::{InboundEvent, ProxyResponse};

/// Deliveries the relay cannot answer.
///
/// These are left to the host to report, like any unhandled failure.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Handles webhook deliveries for one downstream repository.
#[derive(Clone)]
pub struct Relay {
    secret: String,
    dispatcher: Dispatcher,
    notifier: Notifier,
}

impl Relay {
    /// Build a relay from configuration, sharing one HTTP client.
    pub fn new(config: &Config) -> Result<Self, RelayError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(RelayError::HttpClient)?;

        let dispatcher = Dispatcher::new(
            client.clone(),
            &config.github_api_base,
            &config.repo,
            config.github_pat.clone(),
        );

        let mailgun = match (&config.mailgun_api_key, &config.mailgun_domain) {
            (Some(key), Some(domain)) => Some(Mailgun::new(
                client,
                &config.mailgun_api_base,
                domain,
                key.clone(),
            )),
            _ => None,
        };

        let notifier = Notifier::new(
            config.mail_source.clone(),
            config.mail_recipient.clone(),
            config.mail_subject_prefix.clone(),
            mailgun,
        );

        Ok(Self::from_parts(config.sig_key.clone(), dispatcher, notifier))
    }

    pub fn from_parts(secret: String, dispatcher: Dispatcher, notifier: Notifier) -> Self {
        Self {
            secret,
            dispatcher,
            notifier,
        }
    }

    /// Handle one delivery.
    ///
    /// Returns `Err` only for payloads that pass verification but cannot be
    /// understood; every other outcome is a response.
    pub async fn handle(&self, event: &InboundEvent) -> Result<ProxyResponse, RelayError> {
        let signature = event.header(SIGNATURE_HEADER);
        if !verify_signature(&self.secret, event.body.as_bytes(), signature) {
            warn!(
                has_signature = signature.is_some(),
                body_length = event.body.len(),
                "relay_signature_invalid"
            );
            return Ok(ProxyResponse::new(400, "Invalid signature"));
        }

        let payload: PushPayload = serde_json::from_str(&event.body)?;

        let (commit, reference) = match payload.classify()? {
            PushEvent::Ping => {
                info!("relay_ping_event");
                return Ok(ProxyResponse::new(200, "success"));
            }
            PushEvent::BranchDeleted => {
                info!("relay_branch_deleted");
                return Ok(ProxyResponse::new(200, "success"));
            }
            PushEvent::Push { commit, reference } => (commit, reference),
        };

        info!(commit = %commit, reference = %reference, "relay_push_event");

        match self.dispatcher.dispatch(&commit, &reference).await {
            Ok(outcome) if outcome.is_success() => {
                Ok(ProxyResponse::new(outcome.status_code, "success"))
            }
            Ok(outcome) => {
                error!(
                    commit = %commit,
                    status_code = outcome.status_code,
                    body = %outcome.body,
                    "relay_dispatch_rejected"
                );
                self.report(FailureReport {
                    commit: &commit,
                    status_code: Some(outcome.status_code),
                    error: outcome.body.clone(),
                })
                .await;
                Ok(ProxyResponse::new(outcome.status_code, outcome.body))
            }
            Err(e) => {
                error!(commit = %commit, error = %e, "relay_dispatch_failed");
                let message = e.to_string();
                self.report(FailureReport {
                    commit: &commit,
                    status_code: None,
                    error: Value::String(message.clone()),
                })
                .await;
                Ok(ProxyResponse::new(502, message))
            }
        }
    }

    /// Send a failure report, logging instead of propagating errors.
    async fn report(&self, report: FailureReport<'_>) {
        if let Err(e) = self.notifier.notify(&report).await {
            error!(commit = %report.commit, error = %e, "relay_notify_failed");
        }
    }
}

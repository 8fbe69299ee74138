//! Repository dispatch client.
//!
//! Triggers a `repository_dispatch` event on the downstream repository so a
//! workflow there can create the tag. A single attempt is made per delivery.
//! Reference: https://docs.github.com/en/rest/repos/repos#create-a-repository-dispatch-event

use reqwest::{header, Client};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

/// Event type the downstream workflow listens for.
pub const DISPATCH_EVENT_TYPE: &str = "create-tag";

/// REST API version pinned on every request.
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Body of a repository dispatch request.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest<'a> {
    pub event_type: &'static str,
    pub client_payload: ClientPayload<'a>,
}

/// Data handed to the downstream workflow.
#[derive(Debug, Clone, Serialize)]
pub struct ClientPayload<'a> {
    pub commit: &'a str,
    #[serde(rename = "ref")]
    pub reference: &'a str,
}

impl<'a> DispatchRequest<'a> {
    pub fn new(commit: &'a str, reference: &'a str) -> Self {
        Self {
            event_type: DISPATCH_EVENT_TYPE,
            client_payload: ClientPayload { commit, reference },
        }
    }
}

/// Response from the dispatch endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// HTTP status returned by GitHub
    pub status_code: u16,
    /// Response body; JSON when possible, otherwise the raw text
    pub body: Value,
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// The dispatch request never produced a response.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch request timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("dispatch request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for DispatchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Transport(e)
        }
    }
}

/// Client for the repository dispatch endpoint of one repository.
#[derive(Clone)]
pub struct Dispatcher {
    client: Client,
    endpoint: String,
    token: String,
}

impl Dispatcher {
    /// Create a dispatcher for `repo` (`owner/name`) under `api_base`.
    pub fn new(client: Client, api_base: &Url, repo: &str, token: String) -> Self {
        let endpoint = format!(
            "{}/repos/{}/dispatches",
            api_base.as_str().trim_end_matches('/'),
            repo
        );
        Self {
            client,
            endpoint,
            token,
        }
    }

    #[cfg(test)]
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one dispatch for `commit` on `reference`.
    ///
    /// Any HTTP response, successful or not, is an `Ok` outcome; only a
    /// missing response is an error.
    pub async fn dispatch(
        &self,
        commit: &str,
        reference: &str,
    ) -> Result<DispatchOutcome, DispatchError> {
        info!(
            endpoint = %self.endpoint,
            commit = %commit,
            reference = %reference,
            event_type = DISPATCH_EVENT_TYPE,
            "dispatch_starting"
        );

        let result = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .bearer_auth(&self.token)
            .json(&DispatchRequest::new(commit, reference))
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                error!(endpoint = %self.endpoint, error = %e, "dispatch_request_error");
                return Err(e.into());
            }
        };

        let status_code = resp.status().as_u16();
        // The status already arrived; a broken body must not hide it
        let body = match resp.text().await {
            Ok(text) => parse_body(text),
            Err(e) => {
                warn!(
                    endpoint = %self.endpoint,
                    status_code = status_code,
                    error = %e,
                    "dispatch_body_read_error"
                );
                Value::Null
            }
        };
        let outcome = DispatchOutcome { status_code, body };

        info!(
            commit = %commit,
            status_code = status_code,
            is_success = outcome.is_success(),
            "dispatch_complete"
        );

        Ok(outcome)
    }
}

/// Interpret a response body, keeping non-JSON text as a string.
fn parse_body(text: String) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&text).unwrap_or(Value::String(text))
}

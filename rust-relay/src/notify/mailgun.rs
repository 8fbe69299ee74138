//! Mailgun message sending.
//!
//! Messages go through the Mailgun messages API as form-encoded data, which
//! Mailgun treats as UTF-8.
//! Reference: https://documentation.mailgun.com/docs/mailgun/api-reference/openapi-final/tag/Messages/

use reqwest::Client;
use tracing::info;
use url::Url;

use super::{Email, NotifyError};

/// Mailgun client bound to one sending domain.
#[derive(Clone)]
pub struct Mailgun {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl Mailgun {
    pub fn new(client: Client, api_base: &Url, domain: &str, api_key: String) -> Self {
        let endpoint = format!(
            "{}/v3/{}/messages",
            api_base.as_str().trim_end_matches('/'),
            domain
        );
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    #[cfg(test)]
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a plain-text email.
    pub async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        let form = [
            ("from", email.source.as_str()),
            ("to", email.recipient.as_str()),
            ("subject", email.subject.as_str()),
            ("text", email.text.as_str()),
        ];

        let resp = self
            .client
            .post(&self.endpoint)
            .basic_auth("api", Some(&self.api_key))
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status_code: status.as_u16(),
                body,
            });
        }

        info!(
            recipient = %email.recipient,
            status_code = status.as_u16(),
            "mailgun_message_sent"
        );

        Ok(())
    }
}

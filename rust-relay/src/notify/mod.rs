//! Failure notifications.
//!
//! When a dispatch fails, an email describing the failure is sent to the
//! configured recipient. Sending is best effort: callers log the returned
//! error and carry on.

pub mod mailgun;

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

pub use mailgun::Mailgun;

/// Errors raised while sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to reach mail provider: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected message with status {status_code}: {body}")]
    Rejected { status_code: u16, body: String },
}

/// A plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub source: String,
    pub recipient: String,
    pub subject: String,
    pub text: String,
}

/// Details of a failed dispatch.
#[derive(Debug, Clone)]
pub struct FailureReport<'a> {
    /// Commit the dispatch was for
    pub commit: &'a str,
    /// Status returned by GitHub, if a response arrived at all
    pub status_code: Option<u16>,
    /// Response body, or the transport error
    pub error: Value,
}

impl fmt::Display for FailureReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "An error occurred while trying to process the webhook push event."
        )?;
        writeln!(f, "Commit: {}", self.commit)?;
        writeln!(f)?;
        match self.status_code {
            Some(code) => writeln!(f, "Code:   {}", code)?,
            None => writeln!(f, "Code:   none")?,
        }
        match &self.error {
            Value::String(text) => writeln!(f, "Error:  {}", text),
            other => writeln!(f, "Error:  {}", other),
        }
    }
}

/// Sends failure reports to one recipient.
#[derive(Clone)]
pub struct Notifier {
    source: String,
    recipient: String,
    subject_prefix: String,
    mailgun: Option<Mailgun>,
}

impl Notifier {
    pub fn new(
        source: String,
        recipient: String,
        subject_prefix: String,
        mailgun: Option<Mailgun>,
    ) -> Self {
        Self {
            source,
            recipient,
            subject_prefix,
            mailgun,
        }
    }

    #[cfg(test)]
    fn is_enabled(&self) -> bool {
        self.mailgun.is_some()
    }

    /// Build the email for a report.
    pub fn compose(&self, report: &FailureReport<'_>) -> Email {
        Email {
            source: self.source.clone(),
            recipient: self.recipient.clone(),
            subject: format!("{} Error occurred", self.subject_prefix),
            text: report.to_string(),
        }
    }

    /// Send a report.
    ///
    /// Without a mail provider the composed message is only logged.
    pub async fn notify(&self, report: &FailureReport<'_>) -> Result<(), NotifyError> {
        let email = self.compose(report);

        let Some(mailgun) = &self.mailgun else {
            warn!(
                commit = %report.commit,
                subject = %email.subject,
                text = %email.text,
                "notify_mail_disabled"
            );
            return Ok(());
        };

        mailgun.send(&email).await?;
        info!(commit = %report.commit, recipient = %email.recipient, "notify_sent");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn notifier() -> Notifier {
        Notifier::new(
            "relay@example.com".to_string(),
            "ops@example.com".to_string(),
            "[mypy-wheels]".to_string(),
            None,
        )
    }

    #[test]
    fn test_compose_with_status() {
        let report = FailureReport {
            commit: "abc123",
            status_code: Some(500),
            error: json!({"error": "boom"}),
        };

        let email = notifier().compose(&report);

        assert_eq!(email.source, "relay@example.com");
        assert_eq!(email.recipient, "ops@example.com");
        assert_eq!(email.subject, "[mypy-wheels] Error occurred");
        assert_eq!(
            email.text,
            "An error occurred while trying to process the webhook push event.\n\
             Commit: abc123\n\
             \n\
             Code:   500\n\
             Error:  {\"error\":\"boom\"}\n"
        );
    }

    #[test]
    fn test_compose_without_status() {
        let report = FailureReport {
            commit: "abc123",
            status_code: None,
            error: Value::String("dispatch request timed out".to_string()),
        };

        let text = notifier().compose(&report).text;

        assert!(text.contains("Code:   none\n"));
        assert!(text.contains("Error:  dispatch request timed out\n"));
    }

    #[tokio::test]
    async fn test_notify_disabled_is_ok() {
        let notifier = notifier();
        let report = FailureReport {
            commit: "abc123",
            status_code: Some(502),
            error: Value::Null,
        };

        assert!(!notifier.is_enabled());
        assert!(notifier.notify(&report).await.is_ok());
    }
}

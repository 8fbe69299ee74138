//! Push webhook payload types.
//!
//! Only the handful of fields needed to classify a delivery are modelled;
//! everything else GitHub sends is ignored.

use serde::Deserialize;
use thiserror::Error;

/// Fields of a GitHub push (or ping) delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushPayload {
    /// Commit SHA the ref points to after the push
    #[serde(default)]
    pub after: Option<String>,
    /// Random GitHub zen quote, only present on ping deliveries
    #[serde(default)]
    pub zen: Option<String>,
    /// Whether the push deleted the ref
    #[serde(default)]
    pub deleted: Option<bool>,
    /// Full ref that was pushed, e.g. `refs/heads/main`
    #[serde(default, rename = "ref")]
    pub reference: Option<String>,
}

/// What a delivery asks the relay to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushEvent {
    /// Connectivity check sent when the webhook is created
    Ping,
    /// A branch was deleted; nothing to tag
    BranchDeleted,
    /// A commit landed on `reference`
    Push { commit: String, reference: String },
}

/// A delivery that is neither a ping, a deletion nor a usable push.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("push payload has no `after` commit")]
    MissingCommit,
    #[error("push payload has no `ref`")]
    MissingRef,
}

impl PushPayload {
    /// Classify the delivery.
    ///
    /// Pings are checked before deletions, and both before the commit is
    /// required.
    pub fn classify(self) -> Result<PushEvent, ClassifyError> {
        let has_zen = self.zen.as_deref().is_some_and(|z| !z.is_empty());
        if self.after.is_none() && has_zen {
            return Ok(PushEvent::Ping);
        }

        if self.deleted.unwrap_or(false) {
            return Ok(PushEvent::BranchDeleted);
        }

        let commit = self.after.ok_or(ClassifyError::MissingCommit)?;
        let reference = self.reference.ok_or(ClassifyError::MissingRef)?;

        Ok(PushEvent::Push { commit, reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(json: &str) -> Result<PushEvent, ClassifyError> {
        serde_json::from_str::<PushPayload>(json).unwrap().classify()
    }

    #[test]
    fn test_classify_ping() {
        let json = r#"{"zen": "Design for failure.", "hook_id": 42, "hook": {"type": "Repository"}}"#;
        assert_eq!(classify(json), Ok(PushEvent::Ping));
    }

    #[test]
    fn test_classify_ping_requires_zen_text() {
        assert_eq!(classify(r#"{"zen": ""}"#), Err(ClassifyError::MissingCommit));
        assert_eq!(classify(r#"{"zen": null}"#), Err(ClassifyError::MissingCommit));
    }

    #[test]
    fn test_classify_zen_with_commit_is_push() {
        let json = r#"{"zen": "Speak like a human.", "after": "abc123", "ref": "refs/heads/main"}"#;
        assert_eq!(
            classify(json),
            Ok(PushEvent::Push {
                commit: "abc123".to_string(),
                reference: "refs/heads/main".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_deleted() {
        let json = r#"{
            "ref": "refs/heads/feature",
            "before": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
            "after": "0000000000000000000000000000000000000000",
            "deleted": true
        }"#;
        assert_eq!(classify(json), Ok(PushEvent::BranchDeleted));
    }

    #[test]
    fn test_classify_push() {
        let json = r#"{
            "ref": "refs/tags/v1.2.0",
            "after": "abc123",
            "deleted": false,
            "repository": {"full_name": "octo/wheels"},
            "commits": []
        }"#;
        assert_eq!(
            classify(json),
            Ok(PushEvent::Push {
                commit: "abc123".to_string(),
                reference: "refs/tags/v1.2.0".to_string(),
            })
        );
    }

    #[test]
    fn test_classify_missing_fields() {
        assert_eq!(classify("{}"), Err(ClassifyError::MissingCommit));
        assert_eq!(classify(r#"{"after": "abc123"}"#), Err(ClassifyError::MissingRef));
    }

    #[test]
    fn test_payload_rejects_non_object() {
        assert!(serde_json::from_str::<PushPayload>("not json").is_err());
        assert!(serde_json::from_str::<PushPayload>(r#""string""#).is_err());
    }
}

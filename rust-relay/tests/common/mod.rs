//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use tagrelay::web::{sign, SIGNATURE_HEADER};
use tagrelay::{Config, InboundEvent, Relay};

pub const SECRET: &str = "It's a Secret to Everybody";
pub const REPO: &str = "octo/wheels";
pub const TOKEN: &str = "ghp_test_token";
pub const MAIL_DOMAIN: &str = "mg.example.com";
pub const DISPATCH_PATH: &str = "/repos/octo/wheels/dispatches";
pub const MAIL_PATH: &str = "/v3/mg.example.com/messages";

/// Configuration pointing both providers at mock servers.
pub fn config(github_base: &str, mailgun_base: Option<&str>) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("SIG_KEY", SECRET.to_string()),
        ("REPO", REPO.to_string()),
        ("GITHUB_PAT", TOKEN.to_string()),
        ("MAIL_SOURCE", "relay@example.com".to_string()),
        ("MAIL_RECIPIENT", "ops@example.com".to_string()),
        ("GITHUB_API_BASE", github_base.to_string()),
        ("REQUEST_TIMEOUT_MS", "2000".to_string()),
    ]);

    if let Some(base) = mailgun_base {
        vars.insert("MAILGUN_API_BASE", base.to_string());
        vars.insert("MAILGUN_API_KEY", "key-test".to_string());
        vars.insert("MAILGUN_DOMAIN", MAIL_DOMAIN.to_string());
    }

    Config::from_lookup(|name| vars.get(name).cloned()).expect("test config is valid")
}

pub fn relay(github_base: &str, mailgun_base: Option<&str>) -> Relay {
    Relay::new(&config(github_base, mailgun_base)).expect("relay builds")
}

/// `X-Hub-Signature-256` value of a body under the test secret.
pub fn signature(body: &str) -> String {
    sign(SECRET, body.as_bytes()).expect("test secret is a valid key")
}

/// An event signed with the test secret.
pub fn signed_event(body: &str) -> InboundEvent {
    InboundEvent::new(
        body,
        HashMap::from([(SIGNATURE_HEADER.to_string(), signature(body))]),
    )
}

pub const PUSH_BODY: &str = r#"{"ref":"refs/heads/main","before":"9f8e7d","after":"abc123","deleted":false}"#;
pub const PING_BODY: &str = r#"{"zen":"Mind your words, they are important.","hook_id":1}"#;
pub const DELETED_BODY: &str = r#"{"ref":"refs/heads/old","after":"0000000000000000000000000000000000000000","deleted":true}"#;

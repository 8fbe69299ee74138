//! Configuration module for environment variable parsing.
//!
//! All settings are read once at startup into an explicit [`Config`] that is
//! handed to the relay; nothing reads the environment after that.

use std::env;

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Default base URL of the GitHub REST API.
pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";

/// Default base URL of the Mailgun API.
pub const DEFAULT_MAILGUN_API_BASE: &str = "https://api.mailgun.net";

/// Errors raised while loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(&'static str),
    #[error("environment variable `{name}` is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Shared secret used to sign webhook deliveries
    pub sig_key: String,

    /// Repository receiving the dispatch, as `owner/name`
    pub repo: String,

    /// Token used to authenticate against the GitHub API
    pub github_pat: String,

    /// Sender address of failure notifications
    pub mail_source: String,

    /// Recipient address of failure notifications
    pub mail_recipient: String,

    /// Subject prefix of failure notifications
    pub mail_subject_prefix: String,

    // =========================================================================
    // Outbound Providers
    // =========================================================================

    /// Base URL of the GitHub REST API
    pub github_api_base: Url,

    /// Base URL of the Mailgun API
    pub mailgun_api_base: Url,

    /// Mailgun API key; mail is disabled without it
    pub mailgun_api_key: Option<String>,

    /// Mailgun sending domain; mail is disabled without it
    pub mailgun_domain: Option<String>,

    /// HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,

    // =========================================================================
    // Web Server Configuration
    // =========================================================================

    /// Port for the web server to listen on
    pub port: u16,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("repo", &self.repo)
            .field("mail_source", &self.mail_source)
            .field("mail_recipient", &self.mail_recipient)
            .field("mail_subject_prefix", &self.mail_subject_prefix)
            .field("github_api_base", &self.github_api_base.as_str())
            .field("mailgun_api_base", &self.mailgun_api_base.as_str())
            .field("mailgun_domain", &self.mailgun_domain)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(Config {
            sig_key: required("SIG_KEY")?,
            repo: parse_repo(required("REPO")?)?,
            github_pat: required("GITHUB_PAT")?,
            mail_source: required("MAIL_SOURCE")?,
            mail_recipient: required("MAIL_RECIPIENT")?,

            mail_subject_prefix: optional("MAIL_SUBJECT_PREFIX")
                .unwrap_or_else(|| "[mypy-wheels]".to_string()),

            github_api_base: parse_url(
                "GITHUB_API_BASE",
                optional("GITHUB_API_BASE"),
                DEFAULT_GITHUB_API_BASE,
            )?,

            mailgun_api_base: parse_url(
                "MAILGUN_API_BASE",
                optional("MAILGUN_API_BASE"),
                DEFAULT_MAILGUN_API_BASE,
            )?,

            mailgun_api_key: optional("MAILGUN_API_KEY"),

            mailgun_domain: optional("MAILGUN_DOMAIN"),

            request_timeout_ms: parse_number(
                "REQUEST_TIMEOUT_MS",
                optional("REQUEST_TIMEOUT_MS"),
                10_000,
            ),

            port: parse_number("PORT", optional("PORT"), 8080),
        })
    }

    /// Whether both Mailgun settings are present.
    pub fn mail_enabled(&self) -> bool {
        self.mailgun_api_key.is_some() && self.mailgun_domain.is_some()
    }
}

/// Check that a repository is given as `owner/name`.
fn parse_repo(raw: String) -> Result<String, ConfigError> {
    match raw.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok(raw)
        }
        _ => Err(ConfigError::Invalid {
            name: "REPO",
            reason: format!("expected `owner/name`, got `{}`", raw),
        }),
    }
}

/// Parse a base URL, falling back to `default` when unset.
fn parse_url(name: &'static str, raw: Option<String>, default: &str) -> Result<Url, ConfigError> {
    let raw = raw.unwrap_or_else(|| default.to_string());
    let url = Url::parse(&raw).map_err(|e| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("`{}` is not an http(s) base URL", raw),
        });
    }

    Ok(url)
}

/// Parse a numeric setting, keeping the default on bad input.
fn parse_number<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr,
{
    let Some(raw) = raw else {
        return default;
    };

    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

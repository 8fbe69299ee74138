//! tagrelay - GitHub push webhook relay.
//!
//! Verifies GitHub push deliveries and turns each new commit into a
//! `repository_dispatch` event on a downstream repository, emailing an
//! operator when the dispatch fails.
//!
//! Two front-ends share the library:
//! - `tagrelay`: HTTP server receiving webhooks
//! - `tagrelay-invoke`: one-shot runner for platform-style events
//!
//! ## Flow
//!
//! ```text
//! GitHub → verify → classify → repository_dispatch → (Mailgun on failure)
//! ```

pub mod config;
pub mod github;
pub mod notify;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use github::{Dispatcher, PushEvent, PushPayload};
pub use notify::{FailureReport, Notifier};
pub use relay::{InboundEvent, ProxyResponse, Relay, RelayError};
pub use web::AppState;

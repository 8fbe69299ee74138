//! GitHub side of the relay.
//!
//! This module provides:
//! - The inbound push payload and its classification
//! - The outbound repository dispatch client

pub mod dispatch;
pub mod payload;

pub use dispatch::{
    DispatchError, DispatchOutcome, DispatchRequest, Dispatcher, DISPATCH_EVENT_TYPE,
    GITHUB_API_VERSION,
};
pub use payload::{ClassifyError, PushEvent, PushPayload};

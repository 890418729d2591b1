//! Fetch Cache - client-side request cache and resilience layer
//!
//! Serves fresh payloads from memory, collapses concurrent requests for the
//! same key into one network call, and retries failed calls with
//! exponential backoff under a per-attempt deadline.

use std::sync::Arc;

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod executor;
pub mod request;
pub mod tasks;

pub use config::Config;
pub use controller::CachedFetchController;
pub use error::{FetchError, Result};
pub use executor::{HttpTransport, RequestExecutor, RetryPolicy, Transport, TransportResponse};
pub use request::{FetchOptions, Method, RequestSpec};
pub use tasks::spawn_cleanup_task;

/// Parsed JSON response body, shared by every caller that asked for it.
pub type Payload = Arc<serde_json::Value>;

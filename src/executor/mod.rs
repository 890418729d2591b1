//! Executor Module
//!
//! Resilient request execution over a pluggable transport.
//!
//! # Components
//! - `Transport`: one HTTP exchange; `HttpTransport` is the reqwest implementation
//! - `RequestExecutor`: per-attempt deadline, exponential backoff, retry budget

mod retry;
mod transport;

pub use retry::{backoff_delay, RequestExecutor, RetryPolicy, BASE_BACKOFF_MS};
pub use transport::{HttpTransport, Transport, TransportResponse};

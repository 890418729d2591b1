//! Request Module
//!
//! Request descriptions, cache-key derivation and per-call fetch options.

mod options;
mod spec;

pub use options::FetchOptions;
pub use spec::{Method, RequestSpec};

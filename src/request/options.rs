//! Fetch Options
//!
//! Per-call knobs for the cached fetch controller.

use std::collections::BTreeMap;

use crate::error::{FetchError, Result};

/// Options for one `fetch` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOptions {
    /// Freshness window for the written entry; `None` uses the configured default
    pub ttl_seconds: Option<u64>,
    /// Bypass the cache read. A successful response is still written.
    pub skip_cache: bool,
    /// Extra headers merged into the request
    pub headers: BTreeMap<String, String>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn skip_cache(mut self) -> Self {
        self.skip_cache = true;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Resolves the effective TTL, rejecting zero.
    pub fn effective_ttl(&self, default_ttl: u64) -> Result<u64> {
        match self.ttl_seconds.unwrap_or(default_ttl) {
            0 => Err(FetchError::InvalidRequest(
                "ttl_seconds must be greater than zero".to_string(),
            )),
            ttl => Ok(ttl),
        }
    }
}

//! Configuration Module
//!
//! Defaults for cache freshness, request deadlines and retry budget.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{FetchError, Result};
use crate::executor::RetryPolicy;

/// Fetch layer configuration parameters.
///
/// Every value has a sensible default; there is no environment or file
/// based configuration at this layer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default freshness window in seconds for fetches without explicit TTL
    pub default_ttl: u64,
    /// Per-attempt request deadline in milliseconds
    pub timeout_ms: u64,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Base URL that relative request paths are joined onto
    pub base_url: Option<String>,
    /// Which failures are worth another attempt
    pub retry_policy: RetryPolicy,
    /// Headers sent with every request
    pub default_headers: HashMap<String, String>,
}

impl Config {
    /// Sets the base URL for relative request paths.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl: u64) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_cleanup_interval(mut self, cleanup_interval: u64) -> Self {
        self.cleanup_interval = cleanup_interval;
        self
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Adds a header sent with every request.
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Per-attempt deadline as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Pause between stale-entry sweeps as a Duration.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    // == Validate ==
    /// Rejects values that would break cache or executor invariants.
    pub fn validate(&self) -> Result<()> {
        if self.default_ttl == 0 {
            return Err(FetchError::InvalidRequest(
                "default_ttl must be greater than zero".to_string(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(FetchError::InvalidRequest(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(FetchError::InvalidRequest(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        if self.cleanup_interval == 0 {
            return Err(FetchError::InvalidRequest(
                "cleanup_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 60,
            timeout_ms: 10_000,
            max_retries: 1,
            max_entries: 1000,
            cleanup_interval: 30,
            base_url: None,
            retry_policy: RetryPolicy::RetryAll,
            default_headers: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 60);
        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.cleanup_interval, 30);
        assert!(config.base_url.is_none());
        assert_eq!(config.retry_policy, RetryPolicy::RetryAll);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builders() {
        let config = Config::default()
            .with_base_url("https://api.example.test")
            .with_timeout_ms(2_500)
            .with_max_retries(3)
            .with_cleanup_interval(5)
            .with_default_header("accept", "application/json");

        assert_eq!(config.base_url.as_deref(), Some("https://api.example.test"));
        assert_eq!(config.timeout(), Duration::from_millis(2_500));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.cleanup_interval(), Duration::from_secs(5));
        assert_eq!(
            config.default_headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_config_validate_rejects_zero_values() {
        assert!(Config::default().with_default_ttl(0).validate().is_err());
        assert!(Config::default().with_timeout_ms(0).validate().is_err());
        assert!(Config::default().with_max_entries(0).validate().is_err());
        assert!(Config::default().with_cleanup_interval(0).validate().is_err());
    }
}

//! Resilient Request Executor
//!
//! Runs one logical request with a per-attempt deadline and exponential
//! backoff between attempts.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::Transport;
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::request::RequestSpec;

/// Delay before the first retry; doubles with every further attempt.
pub const BASE_BACKOFF_MS: u64 = 100;

/// Which failures are worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// Every failure is retried while budget remains
    #[default]
    RetryAll,
    /// 4xx responses fail fast, except 408 and 429
    SkipClientErrors,
}

// == Backoff ==
/// Wait before retry number `attempt + 1`: `2^attempt * 100ms`, no jitter.
pub fn backoff_delay(attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(BASE_BACKOFF_MS.saturating_mul(factor))
}

// == Request Executor ==
/// Issues requests through a transport, retrying failed attempts.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    timeout: Duration,
    max_retries: u32,
    policy: RetryPolicy,
}

impl RequestExecutor {
    /// Creates an executor with the given per-attempt deadline and retry budget.
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration, max_retries: u32) -> Self {
        Self {
            transport,
            timeout,
            max_retries,
            policy: RetryPolicy::RetryAll,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self::new(transport, config.timeout(), config.max_retries).with_retry_policy(config.retry_policy)
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    // == Execute ==
    /// Runs `request` until it succeeds or the retry budget is spent.
    ///
    /// Returns the parsed JSON body of the first 2xx response, or the last
    /// error observed.
    pub async fn execute(&self, request: &RequestSpec) -> Result<Value> {
        let timeout = request
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.timeout);
        let max_retries = request.max_retries.unwrap_or(self.max_retries);
        let mut attempt: u32 = 0;

        loop {
            let err = match self.attempt(request, timeout).await {
                Ok(payload) => {
                    debug!(url = %request.url, attempt, "Request succeeded");
                    return Ok(payload);
                }
                Err(err) => err,
            };

            if attempt >= max_retries || !err.is_retryable(self.policy) {
                error!(
                    url = %request.url,
                    attempts = attempt + 1,
                    error = %err,
                    "Request failed"
                );
                return Err(err);
            }

            let delay = backoff_delay(attempt);
            warn!(
                url = %request.url,
                attempt,
                backoff_ms = delay.as_millis() as u64,
                error = %err,
                "Request attempt failed, backing off"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// One attempt under `timeout`. Exceeding it drops the in-progress call.
    async fn attempt(&self, request: &RequestSpec, timeout: Duration) -> Result<Value> {
        let response = tokio::time::timeout(timeout, self.transport.send(request))
            .await
            .map_err(|_| FetchError::Timeout {
                url: request.url.clone(),
                timeout_ms: timeout.as_millis() as u64,
            })??;

        if !response.is_success() {
            return Err(FetchError::from_status(response.status, &response.body));
        }

        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&response.body)
            .map_err(|e| FetchError::Decode(format!("{}: {}", request.url, e)))
    }
}

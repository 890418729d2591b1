//! Error types for the fetch cache
//!
//! Provides unified error handling using thiserror.

use serde_json::Value;
use thiserror::Error;

use crate::executor::RetryPolicy;

/// Maximum length for error response bodies kept on an error
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Plain-text bodies up to this length are used as the error message
const MAX_TEXT_MESSAGE_LENGTH: usize = 200;

// == Fetch Error Enum ==
/// Unified error type for cached fetches.
///
/// Clone so that one outcome can be handed to every caller attached to the
/// same in-flight request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The attempt did not complete before its deadline
    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    /// Connection-level failure (DNS, refused, reset, TLS)
    #[error("Network error: {0}")]
    Transport(String),

    /// The server answered with a non-2xx status
    #[error("{message}")]
    HttpStatus {
        status: u16,
        message: String,
        body: String,
    },

    /// A 2xx body that could not be parsed as the expected payload
    #[error("Invalid response: {0}")]
    Decode(String),

    /// Bad options or request target, never retried
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The background request task failed to complete
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FetchError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    // == From Status ==
    /// Builds an `HttpStatus` error, preferring the body's own message.
    ///
    /// Message precedence: JSON `message`, JSON `error`, a short plain-text
    /// body, then a generic status line.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = Self::message_from_body(body).unwrap_or_else(|| {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("Unknown Status");
            format!("Request failed with status {} {}", status, reason)
        });

        FetchError::HttpStatus {
            status,
            message,
            body: Self::truncate_body(body),
        }
    }

    fn message_from_body(body: &str) -> Option<String> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return None;
        }

        // Only string `message` / `error` fields of a JSON object count
        if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
            if parsed.is_object() {
                return ["message", "error"]
                    .iter()
                    .filter_map(|field| parsed.get(*field).and_then(Value::as_str))
                    .map(|m| m.trim().to_string())
                    .find(|m| !m.is_empty());
            }
        }

        // Non-JSON bodies (plain text proxies, load balancers)
        let looks_like_markup = trimmed.starts_with('<');
        if !looks_like_markup && trimmed.len() <= MAX_TEXT_MESSAGE_LENGTH {
            Some(trimmed.to_string())
        } else {
            None
        }
    }

    // == Status ==
    /// Returns the HTTP status for `HttpStatus` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for deadline failures.
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout { .. })
    }

    // == Is Retryable ==
    /// Whether another attempt may succeed under the given policy.
    pub fn is_retryable(&self, policy: RetryPolicy) -> bool {
        match self {
            FetchError::Timeout { .. } | FetchError::Transport(_) | FetchError::Decode(_) => true,
            FetchError::HttpStatus { status, .. } => match policy {
                RetryPolicy::RetryAll => true,
                RetryPolicy::SkipClientErrors => {
                    !(400..500).contains(status) || *status == 408 || *status == 429
                }
            },
            FetchError::InvalidRequest(_) | FetchError::Internal(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            FetchError::InvalidRequest(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the fetch cache.
pub type Result<T> = std::result::Result<T, FetchError>;

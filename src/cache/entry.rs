//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now" in Unix milliseconds.
pub type Clock = Arc<dyn Fn() -> u64 + Send + Sync>;

// == Cache Entry ==
/// A cached payload together with its write time and freshness window.
///
/// Entries are never mutated after being written; a refresh replaces the
/// whole entry under the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// The stored payload
    pub payload: V,
    /// Write timestamp (Unix milliseconds)
    pub written_at: u64,
    /// Freshness window in seconds, always greater than zero
    pub ttl_seconds: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written now.
    ///
    /// # Arguments
    /// * `payload` - The payload to store
    /// * `ttl_seconds` - Freshness window; zero is raised to one second
    pub fn new(payload: V, ttl_seconds: u64) -> Self {
        Self::with_timestamp(payload, ttl_seconds, current_timestamp_ms())
    }

    /// Creates a new entry with an explicit write time.
    pub fn with_timestamp(payload: V, ttl_seconds: u64, written_at: u64) -> Self {
        Self {
            payload,
            written_at,
            ttl_seconds: ttl_seconds.max(1),
        }
    }

    // == Is Fresh ==
    /// Checks whether the entry is still fresh at `now_ms`.
    ///
    /// Boundary condition: once exactly `ttl_seconds * 1000` milliseconds
    /// have elapsed the entry is stale. A clock that moved backwards
    /// leaves the entry fresh.
    pub fn is_fresh(&self, now_ms: u64) -> bool {
        is_fresh(self.written_at, self.ttl_seconds, now_ms)
    }

    /// Expiration timestamp in Unix milliseconds.
    pub fn expires_at(&self) -> u64 {
        self.written_at.saturating_add(self.ttl_seconds.saturating_mul(1000))
    }

    // == Time To Live ==
    /// Returns remaining freshness in milliseconds, zero once stale.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        self.expires_at().saturating_sub(now_ms)
    }
}

/// Pure freshness predicate: `now - written_at < ttl_seconds * 1000`.
pub fn is_fresh(written_at: u64, ttl_seconds: u64, now_ms: u64) -> bool {
    now_ms.saturating_sub(written_at) < ttl_seconds.saturating_mul(1000)
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Clock reading the system wall time.
pub fn system_clock() -> Clock {
    Arc::new(current_timestamp_ms)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("boats", 60);

        assert_eq!(entry.payload, "boats");
        assert_eq!(entry.ttl_seconds, 60);
        assert!(entry.is_fresh(current_timestamp_ms()));
    }

    #[test]
    fn test_entry_zero_ttl_is_raised() {
        let entry = CacheEntry::new("boats", 0);
        assert_eq!(entry.ttl_seconds, 1);
    }

    #[test]
    fn test_entry_goes_stale() {
        let entry = CacheEntry::new("boats", 1);

        assert!(entry.is_fresh(current_timestamp_ms()));

        sleep(Duration::from_millis(1100));

        assert!(!entry.is_fresh(current_timestamp_ms()));
    }

    #[test]
    fn test_freshness_boundary_condition() {
        let entry = CacheEntry::with_timestamp("boats", 60, 1_000);

        assert!(entry.is_fresh(1_000));
        assert!(entry.is_fresh(60_999));
        // Exactly ttl * 1000 elapsed is stale
        assert!(!entry.is_fresh(61_000));
        assert!(!entry.is_fresh(120_000));
    }

    #[test]
    fn test_clock_moving_backwards_keeps_entry_fresh() {
        let entry = CacheEntry::with_timestamp("boats", 5, 10_000);
        assert!(entry.is_fresh(9_000));
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::with_timestamp("boats", 10, 0);

        assert_eq!(entry.expires_at(), 10_000);
        assert_eq!(entry.ttl_remaining_ms(4_000), 6_000);
        assert_eq!(entry.ttl_remaining_ms(10_000), 0);
        assert_eq!(entry.ttl_remaining_ms(25_000), 0);
    }
}

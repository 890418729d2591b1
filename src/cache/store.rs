//! Cache Store Module
//!
//! Keyed payload storage with freshness checks and LRU-bounded capacity.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};

// == Entry Info ==
/// Diagnostic snapshot of one cache entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub written_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub ttl_remaining_ms: u64,
    pub fresh: bool,
}

// == Cache Store ==
/// Payload storage keyed by request key.
///
/// Writes overwrite unconditionally (last write wins). Inserting a new key
/// at capacity evicts the least recently used entry.
///
/// Lookups take `&self`, so a store behind an `RwLock` serves hits under
/// the read lock. Hit and miss counters are atomic and the LRU order has
/// its own short lock.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-payload storage
    entries: HashMap<String, CacheEntry<V>>,
    /// LRU access tracker
    lru: Mutex<LruTracker>,
    /// Eviction and sweep counters, updated under `&mut self`
    stats: CacheStats,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl<V: Clone> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore holding at most `max_entries` entries.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: Mutex::new(LruTracker::new()),
            stats: CacheStats::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores a payload under `key`, replacing any previous entry.
    ///
    /// # Arguments
    /// * `key` - The request key
    /// * `payload` - The payload to store
    /// * `ttl_seconds` - Freshness window in seconds
    pub fn set(&mut self, key: String, payload: V, ttl_seconds: u64) {
        self.insert(key, CacheEntry::new(payload, ttl_seconds));
    }

    /// Stores a prebuilt entry under `key`.
    pub fn insert(&mut self, key: String, entry: CacheEntry<V>) {
        let is_overwrite = self.entries.contains_key(&key);
        let lru = self.lru.get_mut();

        if !is_overwrite && self.entries.len() >= self.max_entries {
            if let Some(evicted_key) = lru.evict_oldest() {
                self.entries.remove(&evicted_key);
                self.stats.record_eviction();
                debug!(key = %evicted_key, "Evicted least recently used entry");
            }
        }

        lru.touch(&key);
        self.entries.insert(key, entry);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the entry for `key`, fresh or not, and marks it as used.
    pub fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.get(key)?.clone();
        self.lru.lock().touch(key);
        Some(entry)
    }

    // == Get Fresh ==
    /// Returns the payload for `key` only if it is fresh at `now_ms`.
    ///
    /// Counts a hit or a miss. Stale entries stay in place until they are
    /// overwritten or swept.
    pub fn get_fresh(&self, key: &str, now_ms: u64) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if Self::is_fresh(entry, now_ms) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.lru.lock().touch(key);
                Some(entry.payload.clone())
            }
            _ => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Like `get_fresh`, without counting the lookup or touching LRU order.
    pub fn peek_fresh(&self, key: &str, now_ms: u64) -> Option<V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(now_ms))
            .map(|entry| entry.payload.clone())
    }

    /// Pure freshness predicate over an entry.
    pub fn is_fresh(entry: &CacheEntry<V>, now_ms: u64) -> bool {
        entry.is_fresh(now_ms)
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns whether one existed.
    pub fn delete(&mut self, key: &str) -> bool {
        let removed = self.entries.remove(key).is_some();
        if removed {
            self.lru.get_mut().remove(key);
            self.stats.set_total_entries(self.entries.len());
        }
        removed
    }

    // == Clear ==
    /// Removes every entry. Statistics counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.get_mut().clear();
        self.stats.set_total_entries(0);
    }

    // == Cleanup Stale ==
    /// Removes all entries that are no longer fresh at `now_ms`.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_stale(&mut self, now_ms: u64) -> usize {
        let stale_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        let lru = self.lru.get_mut();
        for key in &stale_keys {
            self.entries.remove(key);
            lru.remove(key);
        }

        self.stats.record_expired(stale_keys.len());
        self.stats.set_total_entries(self.entries.len());
        stale_keys.len()
    }

    /// Diagnostic view of the entry under `key`, without touching LRU order.
    pub fn entry_info(&self, key: &str, now_ms: u64) -> Option<EntryInfo> {
        let entry = self.entries.get(key)?;
        let written_at = Utc
            .timestamp_millis_opt(entry.written_at as i64)
            .single()
            .unwrap_or_default();

        Some(EntryInfo {
            key: key.to_string(),
            written_at,
            ttl_seconds: entry.ttl_seconds,
            ttl_remaining_ms: entry.ttl_remaining_ms(now_ms),
            fresh: entry.is_fresh(now_ms),
        })
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.hits = self.hits.load(Ordering::Relaxed);
        stats.misses = self.misses.load(Ordering::Relaxed);
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

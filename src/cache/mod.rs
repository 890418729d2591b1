//! Cache Module
//!
//! In-memory payload cache with TTL freshness and LRU-bounded capacity.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{current_timestamp_ms, is_fresh, system_clock, CacheEntry, Clock};
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::{CacheStore, EntryInfo};

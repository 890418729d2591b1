//! In-Flight Table
//!
//! One shared pending result per key for requests that have been issued but
//! not yet settled.

use std::collections::HashMap;

use futures::future::{BoxFuture, Shared};

use crate::error::Result;
use crate::Payload;

/// Pending outcome that any number of callers can await.
///
/// Every clone resolves to the same `Result`, so coalesced callers share
/// one payload `Arc` or one error.
pub type PendingFetch = Shared<BoxFuture<'static, Result<Payload>>>;

// == In-Flight Table ==
/// Key to pending-request mapping.
///
/// Holds at most one handle per key. Callers wrap it in a lock and perform
/// lookup-then-insert under a single guard.
#[derive(Default)]
pub struct InFlightTable {
    pending: HashMap<String, PendingFetch>,
}

impl InFlightTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the pending handle for `key`, if any.
    pub fn get(&self, key: &str) -> Option<PendingFetch> {
        self.pending.get(key).cloned()
    }

    /// Registers `handle` for `key`, returning false if one is already present.
    pub fn insert(&mut self, key: String, handle: PendingFetch) -> bool {
        if self.pending.contains_key(&key) {
            return false;
        }
        self.pending.insert(key, handle);
        true
    }

    /// Releases the slot for `key`.
    pub fn remove(&mut self, key: &str) -> bool {
        self.pending.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl std::fmt::Debug for InFlightTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlightTable")
            .field("keys", &self.pending.keys().collect::<Vec<_>>())
            .finish()
    }
}

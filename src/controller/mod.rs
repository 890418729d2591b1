//! Controller Module
//!
//! Cache-first fetching with in-flight request de-duplication.

mod fetch;
mod inflight;

pub use crate::cache::Clock;
pub use fetch::{CachedFetchController, SharedStore};
pub use inflight::{InFlightTable, PendingFetch};

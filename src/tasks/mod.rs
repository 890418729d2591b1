//! Background Tasks Module
//!
//! # Tasks
//! - Stale sweep: removes cache entries that are no longer fresh

mod cleanup;

pub use cleanup::spawn_cleanup_task;

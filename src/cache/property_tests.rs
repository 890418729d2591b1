//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check freshness, overwrite, eviction and statistics
//! behavior of the cache store.

use proptest::prelude::*;
use std::collections::HashSet;

use crate::cache::{is_fresh, CacheEntry, CacheStore};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 100;
const TEST_TTL: u64 = 60;
const NOW: u64 = 1_700_000_000_000;

// == Strategies ==
/// Generates request-like keys
fn key_strategy() -> impl Strategy<Value = String> {
    "/[a-z]{1,12}(\\?[a-z]{1,6}=[0-9]{1,4})?"
}

fn payload_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,64}"
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, payload: String },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), payload_strategy())
            .prop_map(|(key, payload)| CacheOp::Set { key, payload }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // **Property 1: Freshness Window**
    // An entry is fresh exactly while less than ttl * 1000 ms have elapsed.
    #[test]
    fn prop_freshness_window(
        written_at in 0u64..NOW,
        ttl_seconds in 1u64..86_400,
        elapsed in 0u64..200_000_000,
    ) {
        let entry = CacheEntry::with_timestamp((), ttl_seconds, written_at);
        let now = written_at + elapsed;

        prop_assert_eq!(entry.is_fresh(now), elapsed < ttl_seconds * 1000);
        prop_assert_eq!(is_fresh(written_at, ttl_seconds, now), entry.is_fresh(now));
    }

    // **Property 2: Reads Observe The Latest Write**
    // After any sequence of writes to one key, a fresh read returns the last payload.
    #[test]
    fn prop_last_write_wins(
        key in key_strategy(),
        payloads in prop::collection::vec(payload_strategy(), 1..10)
    ) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES);

        for payload in &payloads {
            store.insert(key.clone(), CacheEntry::with_timestamp(payload.clone(), TEST_TTL, NOW));
        }

        let last = payloads.last().cloned();
        prop_assert_eq!(store.get_fresh(&key, NOW + 1), last);
        prop_assert_eq!(store.len(), 1);
    }

    // **Property 3: Delete Removes Entry**
    #[test]
    fn prop_delete_removes_entry(key in key_strategy(), payload in payload_strategy()) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES);

        store.set(key.clone(), payload, TEST_TTL);
        prop_assert!(store.contains_key(&key));

        prop_assert!(store.delete(&key));
        prop_assert!(store.get(&key).is_none());
    }

    // **Property 4: Statistics Accuracy**
    // Hits and misses match the outcome of every fresh lookup.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, payload } => {
                    store.insert(key, CacheEntry::with_timestamp(payload, TEST_TTL, NOW));
                }
                CacheOp::Get { key } => match store.get_fresh(&key, NOW) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // **Property 5: Capacity Enforcement**
    // The number of entries never exceeds the configured capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((key_strategy(), payload_strategy()), 1..200)
    ) {
        let max_entries = 25;
        let mut store = CacheStore::new(max_entries);

        for (key, payload) in entries {
            store.set(key, payload, TEST_TTL);
            prop_assert!(
                store.len() <= max_entries,
                "Cache size {} exceeds max {}",
                store.len(),
                max_entries
            );
        }
    }

    // **Property 6: LRU Eviction Order**
    // Filling the cache and adding one more key evicts the least recently used key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(key_strategy(), 3..10),
        new_key in key_strategy(),
    ) {
        let mut seen = HashSet::new();
        let unique_keys: Vec<String> = initial_keys
            .into_iter()
            .filter(|k| seen.insert(k.clone()))
            .collect();

        prop_assume!(unique_keys.len() >= 2);
        prop_assume!(!unique_keys.contains(&new_key));

        let capacity = unique_keys.len();
        let mut store = CacheStore::new(capacity);

        for key in &unique_keys {
            store.set(key.clone(), format!("payload for {}", key), TEST_TTL);
        }

        // Reading the first key makes the second one the eviction candidate
        let first = unique_keys[0].clone();
        let second = unique_keys[1].clone();
        prop_assert!(store.get(&first).is_some());

        store.set(new_key.clone(), "new".to_string(), TEST_TTL);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.contains_key(&second), "Key '{}' should have been evicted", second);
        prop_assert!(store.contains_key(&first));
        prop_assert!(store.contains_key(&new_key));
    }

    // **Property 7: Cleanup Only Removes Stale Entries**
    #[test]
    fn prop_cleanup_only_removes_stale(
        ttls in prop::collection::vec(1u64..20, 1..30),
        elapsed_secs in 0u64..25
    ) {
        let mut store = CacheStore::new(TEST_MAX_ENTRIES);
        for (i, ttl) in ttls.iter().enumerate() {
            store.insert(format!("/k{}", i), CacheEntry::with_timestamp(i, *ttl, NOW));
        }

        let now = NOW + elapsed_secs * 1000;
        let expected_stale = ttls.iter().filter(|ttl| elapsed_secs >= **ttl).count();

        prop_assert_eq!(store.cleanup_stale(now), expected_stale);
        prop_assert_eq!(store.len(), ttls.len() - expected_stale);
        for i in 0..ttls.len() {
            if let Some(entry) = store.get(&format!("/k{}", i)) {
                prop_assert!(entry.is_fresh(now));
            }
        }
    }
}

// == Concurrent Access ==
// The store is shared as Arc<RwLock<CacheStore>>; readers see whole payloads only.
proptest! {
    #![proptest_config(ProptestConfig::with_cases(30))]

    #[test]
    fn prop_concurrent_operation_correctness(
        operations in prop::collection::vec(cache_op_strategy(), 10..50)
    ) {
        use std::sync::Arc;
        use tokio::sync::RwLock;

        let rt = tokio::runtime::Runtime::new().unwrap();

        let result: Result<(), String> = rt.block_on(async {
            let store = Arc::new(RwLock::new(CacheStore::new(TEST_MAX_ENTRIES)));
            let written: Arc<HashSet<String>> = Arc::new(
                operations
                    .iter()
                    .filter_map(|op| match op {
                        CacheOp::Set { payload, .. } => Some(payload.clone()),
                        _ => None,
                    })
                    .collect(),
            );

            let mut handles = vec![];
            for op in operations {
                let store = Arc::clone(&store);
                let written = Arc::clone(&written);
                handles.push(tokio::spawn(async move {
                    match op {
                        CacheOp::Set { key, payload } => {
                            store.write().await.set(key, payload, TEST_TTL);
                        }
                        CacheOp::Get { key } => {
                            let now = crate::cache::current_timestamp_ms();
                            if let Some(payload) = store.read().await.get_fresh(&key, now) {
                                if !written.contains(&payload) {
                                    return Err(format!("Unexpected payload '{}' for '{}'", payload, key));
                                }
                            }
                        }
                        CacheOp::Delete { key } => {
                            store.write().await.delete(&key);
                        }
                    }
                    Ok(())
                }));
            }

            for handle in handles {
                handle.await.map_err(|e| e.to_string())??;
            }
            Ok::<(), String>(())
        });

        prop_assert!(result.is_ok(), "{:?}", result);
    }
}

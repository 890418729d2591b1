//! Cached Fetch Controller
//!
//! Entry point for consumers: fresh cache hits first, then attachment to an
//! in-flight request, then a new request through the executor.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::inflight::{InFlightTable, PendingFetch};
use crate::cache::{system_clock, CacheEntry, CacheStats, CacheStore, Clock, EntryInfo};
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::executor::{HttpTransport, RequestExecutor, Transport};
use crate::request::{FetchOptions, RequestSpec};
use crate::tasks::spawn_cleanup_task;
use crate::Payload;

/// Cache store shared between the controller, its request tasks and the
/// cleanup task.
pub type SharedStore = Arc<RwLock<CacheStore<Payload>>>;

// == Cached Fetch Controller ==
/// Cache-first fetching with per-key request coalescing.
///
/// Clone is cheap; clones share the store and the in-flight table.
#[derive(Clone)]
pub struct CachedFetchController {
    store: SharedStore,
    in_flight: Arc<Mutex<InFlightTable>>,
    executor: RequestExecutor,
    default_ttl: u64,
    cleanup_interval: Duration,
    clock: Clock,
}

/// Sweep interval for controllers built without a `Config`.
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

impl CachedFetchController {
    // == Constructors ==
    /// Creates a controller over an injected store and executor.
    pub fn new(store: SharedStore, executor: RequestExecutor, default_ttl: u64) -> Self {
        Self {
            store,
            in_flight: Arc::new(Mutex::new(InFlightTable::new())),
            executor,
            default_ttl: default_ttl.max(1),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            clock: system_clock(),
        }
    }

    /// Creates a controller talking HTTP through reqwest.
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Creates a controller over a custom transport.
    pub fn with_transport(config: &Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(RwLock::new(CacheStore::new(config.max_entries)));
        let executor = RequestExecutor::from_config(transport, config);
        info!(
            max_entries = config.max_entries,
            default_ttl = config.default_ttl,
            timeout_ms = config.timeout_ms,
            max_retries = config.max_retries,
            cleanup_interval = config.cleanup_interval,
            "Fetch controller initialized"
        );
        Ok(Self::new(store, executor, config.default_ttl)
            .with_cleanup_interval(config.cleanup_interval()))
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Replaces the clock used for freshness checks, entry timestamps and
    /// the cleanup sweep.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    // == Fetch ==
    /// Returns the payload for `key`, from cache when fresh.
    ///
    /// Concurrent calls for the same key share one request and receive the
    /// same outcome. Failures are never cached.
    pub async fn fetch(
        &self,
        key: &str,
        request: &RequestSpec,
        options: &FetchOptions,
    ) -> Result<Payload> {
        let ttl = options.effective_ttl(self.default_ttl)?;

        if !options.skip_cache {
            if let Some(payload) = self.cached(key).await {
                debug!(key, "Cache hit");
                return Ok(payload);
            }
        }

        let mut request = request.clone();
        request.headers.extend(options.headers.clone());

        match self.join_or_start(key, request, ttl, !options.skip_cache).await {
            Joined::Cached(payload) => Ok(payload),
            Joined::Pending(pending) => pending.await,
        }
    }

    /// Fetches and decodes the payload into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        key: &str,
        request: &RequestSpec,
        options: &FetchOptions,
    ) -> Result<T> {
        let payload = self.fetch(key, request, options).await?;
        T::deserialize(payload.as_ref()).map_err(|e| FetchError::Decode(format!("{}: {}", key, e)))
    }

    /// GET `url`, keyed by the request's derived cache key.
    pub async fn get(&self, url: &str, options: &FetchOptions) -> Result<Payload> {
        let request = RequestSpec::get(url);
        let key = request.cache_key();
        self.fetch(&key, &request, options).await
    }

    // == Preload ==
    /// Issues the request now to seed the cache, ignoring any fresh entry.
    ///
    /// Joins an already running request for the same key instead of
    /// starting a second one.
    pub async fn preload(
        &self,
        key: &str,
        request: &RequestSpec,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let ttl = FetchOptions {
            ttl_seconds,
            ..FetchOptions::default()
        }
        .effective_ttl(self.default_ttl)?;

        match self.join_or_start(key, request.clone(), ttl, false).await {
            Joined::Cached(_) => Ok(()),
            Joined::Pending(pending) => pending.await.map(|_| ()),
        }
    }

    // == Invalidate ==
    /// Drops the entry for `key`, or every entry when `key` is `None`.
    ///
    /// Requests already in flight are left alone and may still write a
    /// fresh entry when they complete.
    pub async fn invalidate(&self, key: Option<&str>) {
        match key {
            Some(key) => {
                let removed = self.store.write().await.delete(key);
                debug!(key, removed, "Invalidated cache entry");
            }
            None => self.invalidate_all().await,
        }
    }

    pub async fn invalidate_all(&self) {
        self.store.write().await.clear();
        info!("Invalidated all cache entries");
    }

    // == Diagnostics ==
    pub async fn is_in_flight(&self, key: &str) -> bool {
        self.in_flight.lock().await.contains(key)
    }

    pub async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }

    pub async fn entry_info(&self, key: &str) -> Option<EntryInfo> {
        self.store.read().await.entry_info(key, (self.clock)())
    }

    /// The injected cache store.
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Starts the background sweep of stale entries on this controller's
    /// store, every `cleanup_interval`, judged by this controller's clock.
    pub fn spawn_cleanup(&self) -> JoinHandle<()> {
        spawn_cleanup_task(self.store(), self.cleanup_interval, Arc::clone(&self.clock))
    }

    /// Fresh lookup under the read lock.
    async fn cached(&self, key: &str) -> Option<Payload> {
        let now = (self.clock)();
        self.store.read().await.get_fresh(key, now)
    }

    // == Join Or Start ==
    /// Attaches to the pending request for `key` or registers a new one.
    ///
    /// Lookup and registration happen under one in-flight lock. With
    /// `recheck_cache`, a fresh entry written since the caller's first
    /// lookup is returned instead of starting a request; request tasks
    /// write the store before releasing their slot, so this closes the gap
    /// between the two lookups.
    async fn join_or_start(
        &self,
        key: &str,
        request: RequestSpec,
        ttl: u64,
        recheck_cache: bool,
    ) -> Joined {
        let mut in_flight = self.in_flight.lock().await;

        if let Some(pending) = in_flight.get(key) {
            debug!(key, "Joining in-flight request");
            return Joined::Pending(pending);
        }

        if recheck_cache {
            let now = (self.clock)();
            if let Some(payload) = self.store.read().await.peek_fresh(key, now) {
                return Joined::Cached(payload);
            }
        }

        debug!(key, url = %request.url, "Cache miss, issuing request");
        let pending = self.start_request(key.to_string(), request, ttl);
        in_flight.insert(key.to_string(), pending.clone());
        Joined::Pending(pending)
    }

    /// Spawns the request task for `key`.
    ///
    /// The task writes the store on success and always releases the
    /// in-flight slot last. Running it as its own task keeps it alive when
    /// every caller stops waiting.
    fn start_request(&self, key: String, request: RequestSpec, ttl: u64) -> PendingFetch {
        let executor = self.executor.clone();
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let clock = Arc::clone(&self.clock);

        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(executor.execute(&request))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(FetchError::Internal(format!(
                        "request task for '{}' panicked",
                        key
                    )))
                })
                .map(Arc::new);

            if let Ok(payload) = &outcome {
                let entry = CacheEntry::with_timestamp(Arc::clone(payload), ttl, clock());
                store.write().await.insert(key.clone(), entry);
                debug!(key = %key, ttl, "Cached response");
            }

            in_flight.lock().await.remove(&key);
            outcome
        });

        async move {
            task.await
                .unwrap_or_else(|e| Err(FetchError::Internal(e.to_string())))
        }
        .boxed()
        .shared()
    }
}

/// Result of the in-flight lookup.
enum Joined {
    Cached(Payload),
    Pending(PendingFetch),
}

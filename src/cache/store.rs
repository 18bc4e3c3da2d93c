//! Cache Store Module
//!
//! Named value sets kept in a local durable medium with TTL expiry.
//!
//! The store is an explicitly constructed component: callers own an instance
//! (usually behind an `Arc`) and inject its medium and clock.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CacheStats, Clock, FileMedium, Freshness, FreshnessReport, LocalMedium,
    MemoryMedium, SystemClock, DEFAULT_TTL,
};
use crate::config::Config;
use crate::error::{CacheReadError, MediumError};

// == Cache Options ==
/// Construction-time settings for a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// TTL used by callers that do not pick one
    pub default_ttl: Duration,
    /// Share one in-flight fetch among concurrent callers of the same key
    pub single_flight: bool,
    /// Keys cleared by `invalidate_all` even before this instance writes them
    pub known_keys: Vec<String>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            single_flight: true,
            known_keys: Vec::new(),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// == Cache Store ==
/// Local cache of named value sets with TTL expiry.
#[derive(Debug)]
pub struct CacheStore {
    /// Durable key-value medium
    medium: Arc<dyn LocalMedium>,
    /// Time source for stamping and expiry
    clock: Arc<dyn Clock>,
    options: CacheOptions,
    /// Keys configured or written through this instance
    known_keys: Mutex<BTreeSet<String>>,
    /// Per-key fetch locks for single-flight
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    stats: Mutex<CacheStats>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store over the given medium and clock.
    pub fn new(medium: Arc<dyn LocalMedium>, clock: Arc<dyn Clock>, options: CacheOptions) -> Self {
        let known_keys = options.known_keys.iter().cloned().collect();
        Self {
            medium,
            clock,
            options,
            known_keys: Mutex::new(known_keys),
            in_flight: Mutex::new(HashMap::new()),
            stats: Mutex::new(CacheStats::new()),
        }
    }

    /// Creates a process-local store on the system clock with default options.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryMedium::new()),
            Arc::new(SystemClock),
            CacheOptions::default(),
        )
    }

    /// Creates a store from configuration.
    ///
    /// Uses a [`FileMedium`] when `cache_file` is set, memory otherwise.
    pub fn from_config(config: &Config) -> Result<Self, MediumError> {
        let medium: Arc<dyn LocalMedium> = match &config.cache_file {
            Some(path) => Arc::new(FileMedium::open(path)?),
            None => Arc::new(MemoryMedium::new()),
        };
        Ok(Self::new(medium, Arc::new(SystemClock), config.cache_options()))
    }

    pub fn default_ttl(&self) -> Duration {
        self.options.default_ttl
    }

    // == Get ==
    /// Returns the stored value regardless of age.
    ///
    /// Missing keys and unparsable payloads both read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.read_entry(key).ok().map(|entry| entry.value)
    }

    // == Get Or Fetch ==
    /// Returns the cached value if still valid, otherwise fetches and stores it.
    ///
    /// A failed fetch is returned unchanged and leaves the store untouched, as
    /// does dropping the returned future before the fetch completes. With
    /// single-flight enabled, concurrent callers for the same key wait for the
    /// first fetch and reuse its result.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.valid_value(key) {
            debug!(key, "Using cached data");
            lock(&self.stats).record_hit();
            return Ok(value);
        }

        if !self.options.single_flight {
            return self.fetch_and_store(key, ttl, fetch).await;
        }

        let slot = self.flight_slot(key);
        let guard = Arc::clone(&slot).lock_owned().await;
        // already logged and counted if corrupt
        let result = match self.fresh_value(self.load(key)) {
            Some(value) => {
                debug!(key, "Reusing data fetched by a concurrent caller");
                lock(&self.stats).record_hit();
                Ok(value)
            }
            None => self.fetch_and_store(key, ttl, fetch).await,
        };
        drop(guard);
        self.release_flight_slot(key, slot);
        result
    }

    // == Put ==
    /// Stores `value` under `key` stamped with the current time.
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<(), MediumError> {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        let payload = serde_json::to_string(&entry)?;
        lock(&self.known_keys).insert(key.to_string());
        self.medium.set(key, &payload)
    }

    // == Invalidate ==
    /// Removes the entry under `key`. Idempotent.
    pub fn invalidate(&self, key: &str) {
        if let Err(err) = self.medium.remove(key) {
            warn!(key, error = %err, "Failed to remove cache entry");
        }
        lock(&self.stats).record_invalidation();
        debug!(key, "Cleared cache entry");
    }

    /// Removes every known key, including keys left in the medium by an
    /// earlier process. Returns the number of keys cleared.
    pub fn invalidate_all(&self) -> usize {
        let keys = self.known_keys();
        for key in &keys {
            self.invalidate(key);
        }
        lock(&self.stats).record_flush();
        info!(count = keys.len(), "Cleared all cached data");
        keys.len()
    }

    // == Diagnostics ==
    /// Snapshot of every known key's freshness. Does not modify the store.
    pub fn freshness_report(&self) -> FreshnessReport {
        let now = self.clock.now();
        self.known_keys()
            .into_iter()
            .map(|key| {
                let freshness = match self.load::<Value>(&key) {
                    Ok(entry) => Freshness::of(&entry, now),
                    Err(_) => Freshness::absent(),
                };
                (key, freshness)
            })
            .collect()
    }

    /// Returns true if any known key is absent, stale or older than `max_age`.
    pub fn needs_refresh(&self, max_age: Duration) -> bool {
        let max_age_seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        self.freshness_report()
            .iter()
            .any(|(key, freshness)| {
                let stale = freshness.needs_refresh(max_age_seconds);
                if stale {
                    debug!(
                        key = key.as_str(),
                        present = freshness.present,
                        valid = freshness.valid,
                        age_seconds = ?freshness.age_seconds,
                        "Cache key needs refresh"
                    );
                }
                stale
            })
    }

    /// Adds `key` to the set cleared by `invalidate_all`.
    pub fn register_key(&self, key: impl Into<String>) {
        lock(&self.known_keys).insert(key.into());
    }

    /// Configured, registered and written keys plus every key the medium
    /// holds, in sorted order.
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys = lock(&self.known_keys).clone();
        keys.extend(self.medium.keys());
        keys.into_iter().collect()
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        lock(&self.stats).clone()
    }

    // == Internals ==
    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<CacheEntry<T>, CacheReadError> {
        let raw = self.medium.get(key).ok_or(CacheReadError::Missing)?;
        serde_json::from_str(&raw).map_err(|err| CacheReadError::Corrupt(err.to_string()))
    }

    /// Like `load`, but logs and counts corrupt payloads.
    fn read_entry<T: DeserializeOwned>(&self, key: &str) -> Result<CacheEntry<T>, CacheReadError> {
        self.load(key).map_err(|err| {
            if let CacheReadError::Corrupt(reason) = &err {
                warn!(key, reason = reason.as_str(), "Ignoring unparsable cache payload");
                lock(&self.stats).record_corrupt_read();
            }
            err
        })
    }

    fn valid_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.fresh_value(self.read_entry(key))
    }

    fn fresh_value<T>(&self, entry: Result<CacheEntry<T>, CacheReadError>) -> Option<T> {
        let entry = entry.ok()?;
        entry.is_valid_at(self.clock.now()).then_some(entry.value)
    }

    async fn fetch_and_store<T, E, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T, E>
    where
        T: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        lock(&self.stats).record_miss();
        info!(key, "Fetching fresh data");

        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                lock(&self.stats).record_fetch_failure();
                warn!(key, "Fetch failed; cache left unchanged");
                return Err(err);
            }
        };

        match self.put(key, &value, ttl) {
            Ok(()) => debug!(key, ttl_ms = ttl.as_millis() as u64, "Saved to local cache"),
            Err(err) => warn!(key, error = %err, "Failed to save to local cache"),
        }
        Ok(value)
    }

    fn flight_slot(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut in_flight = lock(&self.in_flight);
        Arc::clone(in_flight.entry(key.to_string()).or_default())
    }

    fn release_flight_slot(&self, key: &str, slot: Arc<AsyncMutex<()>>) {
        let mut in_flight = lock(&self.in_flight);
        // the map and `slot` are the only holders
        if Arc::strong_count(&slot) <= 2 {
            in_flight.remove(key);
        }
    }
}

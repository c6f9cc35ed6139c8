//! Time-to-live cache shared by the configuration resolver and the factory.
//!
//! Entries are valid while `now - inserted_at < ttl`. Expired entries are
//! dropped on read and never served. Keys that are never read again are
//! swept on insert once the map holds more than the sweep threshold. Each entry may record the provider it
//! belongs to so callers can evict a single provider's entries.
//!
//! Concurrent misses on the same key coalesce: [`TtlCache::get_or_try_insert_with`]
//! serializes initialisation per key, so only one caller runs the
//! initialiser and the others observe its result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::ProviderTag;

/// Entry count above which an insert first drops every expired entry.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 256;

/// A cached value with its insertion time.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
    owner: Option<ProviderTag>,
}

impl<V> CacheEntry<V> {
    fn new(value: V, ttl: Duration, owner: Option<ProviderTag>) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            owner,
        }
    }

    /// Whether the entry is still within its time-to-live.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted_at) < self.ttl
    }

    /// Provider this entry belongs to, if known.
    pub fn owner(&self) -> Option<&ProviderTag> {
        self.owner.as_ref()
    }
}

/// Concurrent TTL cache keyed by string.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    inflight: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
    sweep_threshold: usize,
}

impl<V: Clone> TtlCache<V> {
    /// Create an empty cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            inflight: DashMap::new(),
            ttl,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
        }
    }

    /// Sweep expired entries on insert once more than `threshold` are held.
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.sweep_threshold = threshold;
        self
    }

    /// Time-to-live applied to new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a fresh value, evicting it if it has expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.is_fresh(now) {
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| !entry.is_fresh(now));
        None
    }

    /// Insert or replace a value.
    pub fn insert(&self, key: impl Into<String>, value: V, owner: Option<ProviderTag>) {
        if self.entries.len() >= self.sweep_threshold {
            self.purge_expired();
        }
        self.entries
            .insert(key.into(), CacheEntry::new(value, self.ttl, owner));
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now));
        before.saturating_sub(self.entries.len())
    }

    /// Remove a single key.
    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Remove every entry owned by `provider`. Returns how many were removed.
    pub fn invalidate_owner(&self, provider: &ProviderTag) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.owner.as_ref() != Some(provider));
        before.saturating_sub(self.entries.len())
    }

    /// Remove everything.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including ones that expired but were not
    /// read since.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the cached value or run `init` to produce it.
    ///
    /// Only one `init` runs per key at a time; callers that arrive while it
    /// is running wait and then read its result from the cache. Errors are
    /// returned to the caller that ran `init` and are not cached, so a
    /// waiting caller retries.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: &str, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(V, Option<ProviderTag>), E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let lock = self
            .inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            match self.get(key) {
                Some(value) => Ok(value),
                None => match init().await {
                    Ok((value, owner)) => {
                        self.insert(key, value.clone(), owner);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                },
            }
        };

        drop(lock);
        self.inflight
            .remove_if(key, |_, lock| Arc::strong_count(lock) == 1);
        result
    }
}

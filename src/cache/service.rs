//! Cache Service Module
//!
//! Two-tier cache engine: an owned in-memory map in front of a shared
//! persistent store, with lazy time-based expiry.
//!
//! No operation here returns an error to the caller. Storage failures are
//! logged, counted, and treated as a miss or a no-op.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, DEFAULT_EXPIRY_MS, DEFAULT_PREFIX};
use crate::error::{CacheError, Result};
use crate::storage::PersistentStore;

/// Tier a read was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Fast,
    Persistent,
}

// == Cache Service ==
/// Namespaced, expiring key/value cache with a fast and a persistent tier.
pub struct CacheService {
    /// Fast tier, keyed by namespaced key
    fast: HashMap<String, CacheEntry>,
    /// Persistent tier, shared with data outside the namespace
    store: Box<dyn PersistentStore>,
    clock: Arc<dyn Clock>,
    prefix: String,
    window_ms: u64,
    stats: CacheStats,
}

impl fmt::Debug for CacheService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheService")
            .field("prefix", &self.prefix)
            .field("window_ms", &self.window_ms)
            .field("fast_entries", &self.fast.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl CacheService {
    // == Constructors ==
    /// Creates a cache with the default prefix, a five minute window and
    /// the system clock.
    pub fn new(store: impl PersistentStore + 'static) -> Self {
        Self {
            fast: HashMap::new(),
            store: Box::new(store),
            clock: Arc::new(SystemClock),
            prefix: DEFAULT_PREFIX.to_string(),
            window_ms: DEFAULT_EXPIRY_MS,
            stats: CacheStats::new(),
        }
    }

    /// Creates a cache from configuration.
    ///
    /// Fails only if the configuration itself is invalid.
    pub fn from_config(config: &Config, store: impl PersistentStore + 'static) -> Result<Self> {
        config.validate()?;
        let mut cache = Self::new(store);
        cache.prefix = config.namespace_prefix.clone();
        cache.window_ms = config.expiry_window_ms;
        Ok(cache)
    }

    /// Replaces the clock. Intended for construction time.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    // == Accessors ==
    pub fn namespace_prefix(&self) -> &str {
        &self.prefix
    }

    pub fn expiry_window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Returns the key as stored in either tier.
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    // == Get ==
    /// Returns the cached value for `key` if one is fresh.
    ///
    /// Checks the fast tier, then the persistent tier. A persistent hit is
    /// promoted into the fast tier. Stale entries found along the way are
    /// evicted from the tier they were found in. A payload that does not
    /// decode as `T` is reported as a miss and left in place.
    pub fn get<T: DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let Some((entry, tier)) = self.lookup(key) else {
            self.stats.record_miss();
            debug!("Cache miss: {}", key);
            return None;
        };

        match serde_json::from_value(entry.data) {
            Ok(value) => {
                match tier {
                    Tier::Fast => self.stats.record_fast_hit(),
                    Tier::Persistent => self.stats.record_persistent_hit(),
                }
                debug!("Cache hit ({:?}): {}", tier, key);
                Some(value)
            }
            Err(e) => {
                warn!("Cached value for {} has an unexpected shape: {}", key, e);
                self.stats.record_miss();
                None
            }
        }
    }

    // == Contains ==
    /// Returns true if a fresh entry exists, with the same eviction and
    /// promotion side effects as `get`.
    pub fn contains(&mut self, key: &str) -> bool {
        match self.lookup(key) {
            Some((_, Tier::Fast)) => {
                self.stats.record_fast_hit();
                true
            }
            Some((_, Tier::Persistent)) => {
                self.stats.record_persistent_hit();
                true
            }
            None => {
                self.stats.record_miss();
                false
            }
        }
    }

    // == Set ==
    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// The fast tier is always written. A failed persistent write is logged
    /// and any older persistent copy is dropped so a restart cannot serve it.
    /// A value that cannot be serialized replaces nothing: the key is
    /// invalidated in both tiers so the previous value is not served.
    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let cache_key = self.namespaced_key(key);

        let data = match serde_json::to_value(value) {
            Ok(data) => data,
            Err(e) => {
                self.report(&cache_key, "serialize", &CacheError::Serialization(e));
                self.invalidate(key);
                return;
            }
        };

        let entry = CacheEntry::new(data, self.clock.now_ms());

        if let Err(e) = self.write_persistent(&cache_key, &entry) {
            self.report(&cache_key, "write", &e);
            if let Err(e) = self.store.remove_item(&cache_key) {
                self.report(&cache_key, "invalidate", &CacheError::from(e));
            }
        }

        self.fast.insert(cache_key, entry);
        self.stats.set_fast_entries(self.fast.len());
    }

    // == Invalidate ==
    /// Removes `key` from both tiers. Invalidating an absent key is a no-op.
    pub fn invalidate(&mut self, key: &str) {
        let cache_key = self.namespaced_key(key);
        self.fast.remove(&cache_key);
        self.stats.set_fast_entries(self.fast.len());

        if let Err(e) = self.store.remove_item(&cache_key) {
            self.report(&cache_key, "invalidate", &CacheError::from(e));
        }
    }

    // == Clear ==
    /// Removes every entry under the namespace prefix from both tiers.
    /// Persistent keys outside the namespace are left alone.
    pub fn clear(&mut self) {
        self.fast.clear();
        self.stats.set_fast_entries(0);

        let keys = match self.persistent_keys() {
            Ok(keys) => keys,
            Err(e) => {
                let prefix = self.prefix.clone();
                self.report(&prefix, "clear", &e);
                return;
            }
        };

        for cache_key in keys {
            if let Err(e) = self.store.remove_item(&cache_key) {
                self.report(&cache_key, "clear", &CacheError::from(e));
            }
        }
    }

    // == Purge Expired ==
    /// Removes stale and malformed entries under the prefix from both tiers.
    ///
    /// Returns the number of logical keys removed. Nothing calls this
    /// automatically; expiry is otherwise discovered on read.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let window = self.window_ms;
        let mut removed: BTreeSet<String> = BTreeSet::new();

        self.fast.retain(|cache_key, entry| {
            let live = !entry.is_expired(now, window);
            if !live {
                removed.insert(cache_key.clone());
            }
            live
        });
        self.stats.set_fast_entries(self.fast.len());

        let keys = match self.persistent_keys() {
            Ok(keys) => keys,
            Err(e) => {
                let prefix = self.prefix.clone();
                self.report(&prefix, "purge", &e);
                Vec::new()
            }
        };

        for cache_key in keys {
            let stale = match self.store.get_item(&cache_key) {
                Ok(Some(text)) => match CacheEntry::from_json(&text) {
                    Ok(entry) => entry.is_expired(now, window),
                    Err(_) => true,
                },
                Ok(None) => false,
                Err(e) => {
                    self.report(&cache_key, "purge", &CacheError::from(e));
                    false
                }
            };
            if !stale {
                continue;
            }
            match self.store.remove_item(&cache_key) {
                Ok(()) => {
                    removed.insert(cache_key);
                }
                Err(e) => self.report(&cache_key, "purge", &CacheError::from(e)),
            }
        }

        for _ in &removed {
            self.stats.record_expiration();
        }
        if !removed.is_empty() {
            debug!("Purged {} expired cache entries", removed.len());
        }
        removed.len()
    }

    // == Keys ==
    /// Logical keys currently held in either tier, sorted. Includes entries
    /// that have expired but not yet been evicted.
    pub fn keys(&mut self) -> Vec<String> {
        let mut keys: BTreeSet<String> = self.fast.keys().cloned().collect();

        match self.persistent_keys() {
            Ok(persisted) => keys.extend(persisted),
            Err(e) => {
                let prefix = self.prefix.clone();
                self.report(&prefix, "enumerate", &e);
            }
        }

        keys.into_iter()
            .filter_map(|k| k.strip_prefix(self.prefix.as_str()).map(str::to_string))
            .collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_fast_entries(self.fast.len());
        stats
    }

    // == Length ==
    /// Returns the number of entries in the fast tier.
    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }

    // == Internals ==
    /// Finds a fresh entry for `key`, evicting and promoting as needed.
    fn lookup(&mut self, key: &str) -> Option<(CacheEntry, Tier)> {
        let now = self.clock.now_ms();
        let cache_key = self.namespaced_key(key);

        if let Some(entry) = self.fast.get(&cache_key) {
            if !entry.is_expired(now, self.window_ms) {
                return Some((entry.clone(), Tier::Fast));
            }
            self.fast.remove(&cache_key);
            self.stats.record_expiration();
            self.stats.set_fast_entries(self.fast.len());
            debug!("Evicted expired fast-tier entry: {}", cache_key);
        }

        match self.read_persistent(&cache_key, now) {
            Ok(Some(entry)) => {
                self.fast.insert(cache_key, entry.clone());
                self.stats.set_fast_entries(self.fast.len());
                debug!("Promoted persistent entry: {}", key);
                Some((entry, Tier::Persistent))
            }
            Ok(None) => None,
            Err(e) => {
                self.report(&cache_key, "read", &e);
                None
            }
        }
    }

    /// Reads a fresh entry from the persistent tier.
    ///
    /// Malformed text is removed before the decode error is returned.
    /// Expired entries are removed and read as absent.
    fn read_persistent(&mut self, cache_key: &str, now: u64) -> Result<Option<CacheEntry>> {
        let Some(text) = self.store.get_item(cache_key)? else {
            return Ok(None);
        };

        let entry = match CacheEntry::from_json(&text) {
            Ok(entry) => entry,
            Err(source) => {
                if let Err(e) = self.store.remove_item(cache_key) {
                    self.report(cache_key, "self-heal", &CacheError::from(e));
                }
                return Err(CacheError::Decode {
                    key: cache_key.to_string(),
                    source,
                });
            }
        };

        if entry.is_expired(now, self.window_ms) {
            self.stats.record_expiration();
            debug!("Evicted expired persistent entry: {}", cache_key);
            self.store.remove_item(cache_key)?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    fn write_persistent(&self, cache_key: &str, entry: &CacheEntry) -> Result<()> {
        let text = entry.to_json().map_err(CacheError::Serialization)?;
        self.store.set_item(cache_key, &text)?;
        Ok(())
    }

    /// Persistent keys that fall under the namespace prefix.
    fn persistent_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .store
            .keys()?
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect())
    }

    fn report(&mut self, key: &str, op: &str, err: &CacheError) {
        self.stats.record_storage_error();
        warn!("Cache {} error for {}: {}", op, key, err);
    }
}

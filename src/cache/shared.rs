//! Shared Cache Handle
//!
//! Wraps a `CacheService` in `Arc<RwLock<>>` so async request handlers can
//! share one instance, and adds the read-through `get_or_fetch` helper.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheService, CacheStats};

/// Cloneable handle to a single cache instance.
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<RwLock<CacheService>>,
}

impl SharedCache {
    pub fn new(cache: CacheService) -> Self {
        Self {
            inner: Arc::new(RwLock::new(cache)),
        }
    }

    /// Reads need the write lock: eviction and promotion mutate both tiers.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner.write().await.get(key)
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        self.inner.write().await.set(key, value);
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.write().await.invalidate(key);
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }

    pub async fn purge_expired(&self) -> usize {
        self.inner.write().await.purge_expired()
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.read().await.stats()
    }

    // == Get Or Fetch ==
    /// Returns the cached value for `key`, or runs `fetch` and caches its result.
    ///
    /// The lock is released while `fetch` runs. Two callers missing on the
    /// same key at the same time both fetch and both store; the last store
    /// wins. A fetch error is returned as-is and nothing is cached.
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        debug!("Fetching {} after cache miss", key);
        let value = fetch().await?;
        self.set(key, &value).await;
        Ok(value)
    }
}

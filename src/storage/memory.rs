//! In-memory persistent tier
//!
//! Stands in for durable storage in tests and short-lived processes. Clones
//! share the same map, so a test can hold one handle while the cache owns another.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{item_size, PersistentStore};
use crate::error::StorageError;

/// Shared map with an optional byte quota.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Arc<Mutex<HashMap<String, String>>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    /// Creates an empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Arc::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.lock().map(|items| items.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.items
            .lock()
            .map_err(|_| StorageError::Read("memory store lock poisoned".to_string()))
    }
}

impl PersistentStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.lock()?;

        if let Some(quota) = self.quota_bytes {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| item_size(k, v))
                .sum();
            let used = others + item_size(key, value);
            if used > quota {
                return Err(StorageError::QuotaExceeded { used, quota });
            }
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }
}

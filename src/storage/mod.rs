//! Storage Module
//!
//! The persistent tier: a string-to-string key/value store shared with other
//! data under different key prefixes.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

// == Persistent Store Trait ==
/// Durable key/value storage consumed by the cache.
///
/// Every method may fail. Callers treat the store as best-effort.
pub trait PersistentStore: Send + Sync {
    /// Returns the stored text for `key`, or `None` if absent.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every key currently stored, regardless of prefix.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Bytes a key/value pair counts against a quota.
pub(crate) fn item_size(key: &str, value: &str) -> usize {
    key.len() + value.len()
}

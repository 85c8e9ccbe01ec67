//! File-backed persistent tier
//!
//! Keeps every item in a single JSON object on disk, the same shape as a
//! browser origin's local storage. The file survives process restarts.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{item_size, PersistentStore};
use crate::error::StorageError;

type Items = BTreeMap<String, String>;

/// JSON file store with an optional byte quota.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    quota_bytes: Option<usize>,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            quota_bytes: None,
            lock: Mutex::new(()),
        }
    }

    /// Sets a byte quota counted over all keys and values.
    pub fn with_quota(mut self, quota_bytes: Option<usize>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Items, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Items::new()),
            Err(e) => return Err(StorageError::Read(e.to_string())),
        };
        if content.trim().is_empty() {
            return Ok(Items::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StorageError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, items: &Items) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string(items)
            .map_err(|e| StorageError::Write(e.to_string()))?;

        // Write-then-rename keeps the old file intact if the write dies halfway
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>, StorageError> {
        self.lock
            .lock()
            .map_err(|_| StorageError::Write("file store lock poisoned".to_string()))
    }
}

impl PersistentStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let mut items = self.load()?;

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
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.guard()?;
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.save(&items)?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.guard()?;
        Ok(self.load()?.into_keys().collect())
    }
}

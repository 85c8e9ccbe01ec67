//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{CacheError, Result};

/// Default namespace prefix applied to every logical key.
pub const DEFAULT_PREFIX: &str = "mealplanner_";

/// Default expiry window: five minutes.
pub const DEFAULT_EXPIRY_MS: u64 = 5 * 60 * 1000;

/// File name of the persistent tier inside the data directory.
const STORAGE_FILE_NAME: &str = "cache.json";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// Prefix and expiry window are fixed once a `CacheService` is built.
#[derive(Debug, Clone)]
pub struct Config {
    /// Prefix prepended to logical keys in both tiers
    pub namespace_prefix: String,
    /// Maximum age in milliseconds before an entry is stale
    pub expiry_window_ms: u64,
    /// Location of the persistent tier file, None = platform data dir
    pub storage_path: Option<PathBuf>,
    /// Byte quota for the persistent tier, None = unlimited
    pub quota_bytes: Option<usize>,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_PREFIX` - Namespace prefix (default: `mealplanner_`)
    /// - `CACHE_EXPIRY_MS` - Expiry window in milliseconds (default: 300000)
    /// - `CACHE_STORAGE_PATH` - Persistent tier file (default: platform data dir)
    /// - `CACHE_QUOTA_BYTES` - Persistent tier quota (default: unlimited)
    pub fn from_env() -> Self {
        Self {
            namespace_prefix: env::var("CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            expiry_window_ms: env::var("CACHE_EXPIRY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_EXPIRY_MS),
            storage_path: env::var("CACHE_STORAGE_PATH").ok().map(PathBuf::from),
            quota_bytes: env::var("CACHE_QUOTA_BYTES")
                .ok()
                .and_then(|v| v.parse().ok()),
        }
    }

    /// Rejects configurations that would break namespace isolation.
    pub fn validate(&self) -> Result<()> {
        if self.namespace_prefix.is_empty() {
            return Err(CacheError::InvalidConfig(
                "namespace prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolves where the persistent tier lives.
    ///
    /// Returns `None` when no path is configured and the platform data
    /// directory cannot be determined (e.g. no home directory).
    pub fn resolved_storage_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.storage_path {
            return Some(path.clone());
        }
        let dirs = ProjectDirs::from("", "", "mealplanner")?;
        Some(dirs.data_dir().join(STORAGE_FILE_NAME))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            namespace_prefix: DEFAULT_PREFIX.to_string(),
            expiry_window_ms: DEFAULT_EXPIRY_MS,
            storage_path: None,
            quota_bytes: None,
        }
    }
}

//! Command-line interface for inspecting the persistent cache
//!
//! Parses arguments with clap and runs one cache operation per invocation.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::CacheService;

/// Error types for CLI commands
#[derive(Debug, Error)]
pub enum CliError {
    /// The value given to `set` is not JSON
    #[error("Invalid value for '{key}': {source}. Values must be JSON, e.g. '\"text\"' or '{{\"id\":1}}'")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Meal planner cache - inspect and manage cached API responses
#[derive(Parser, Debug)]
#[command(name = "mealplanner-cache")]
#[command(about = "Inspect and manage the meal planner client cache")]
#[command(version)]
pub struct Cli {
    /// Persistent cache file, overrides CACHE_STORAGE_PATH
    #[arg(long, value_name = "PATH")]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// One cache operation
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the fresh value for a key, or null
    Get { key: String },
    /// Store a JSON value under a key
    Set { key: String, value: String },
    /// Remove a key from the cache
    Invalidate { key: String },
    /// Remove every cache entry, leaving other data in the file alone
    Clear,
    /// Remove expired and malformed entries
    Purge,
    /// List cached keys
    Keys,
}

/// Runs `command` against `cache` and returns the JSON report to print.
pub fn run(command: &Command, cache: &mut CacheService) -> Result<Value, CliError> {
    let report = match command {
        Command::Get { key } => {
            let value: Option<Value> = cache.get(key);
            json!({ "key": key, "value": value })
        }
        Command::Set { key, value } => {
            let parsed: Value =
                serde_json::from_str(value).map_err(|source| CliError::InvalidValue {
                    key: key.clone(),
                    source,
                })?;
            let errors_before = cache.stats().storage_errors;
            cache.set(key, &parsed);
            let persisted = cache.stats().storage_errors == errors_before;
            json!({ "key": key, "stored": true, "persisted": persisted })
        }
        Command::Invalidate { key } => {
            cache.invalidate(key);
            json!({ "key": key, "invalidated": true })
        }
        Command::Clear => {
            cache.clear();
            json!({ "cleared": true })
        }
        Command::Purge => json!({ "purged": cache.purge_expired() }),
        Command::Keys => json!({ "keys": cache.keys() }),
    };
    Ok(report)
}

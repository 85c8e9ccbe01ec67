//! Meal Planner Cache CLI
//!
//! Opens the file-backed cache described by the environment and runs a
//! single command against it. Reports go to stdout as JSON, logs to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mealplanner_cache::cli::{self, Cli};
use mealplanner_cache::{CacheService, Config, FileStore};

fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mealplanner_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = &cli.storage {
        config.storage_path = Some(path.clone());
    }

    let path = config
        .resolved_storage_path()
        .context("No storage path configured and no data directory available; set CACHE_STORAGE_PATH")?;
    info!(
        "Opening cache at {} (prefix={}, expiry={}ms)",
        path.display(),
        config.namespace_prefix,
        config.expiry_window_ms
    );

    let store = FileStore::new(path).with_quota(config.quota_bytes);
    let mut cache = CacheService::from_config(&config, store)?;

    let report = cli::run(&cli.command, &mut cache)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

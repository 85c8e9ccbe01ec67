//! Integration Tests for the two-tier cache
//!
//! Drives `CacheService` through the public API against in-memory, failing,
//! and file-backed persistent tiers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mealplanner_cache::{
    CacheEntry, CacheService, FileStore, ManualClock, MemoryStore, PersistentStore, StorageError,
};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

const WINDOW: u64 = 300_000;

// == Helper Types ==

/// Memory store whose reads and writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl FlakyStore {
    fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl PersistentStore for FlakyStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read("storage unavailable".to_string()));
        }
        self.inner.get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write("storage unavailable".to_string()));
        }
        self.inner.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write("storage unavailable".to_string()));
        }
        self.inner.remove_item(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Read("storage unavailable".to_string()));
        }
        self.inner.keys()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct MealPlan {
    id: u32,
    meals: Vec<String>,
}

// == Helper Functions ==

fn create_test_cache() -> (CacheService, FlakyStore, ManualClock) {
    let store = FlakyStore::default();
    let clock = ManualClock::new(0);
    let cache = CacheService::new(store.clone()).with_clock(clock.clone());
    (cache, store, clock)
}

fn sample_plan() -> MealPlan {
    MealPlan {
        id: 1,
        meals: vec![
            "Frikadeller".to_string(),
            "Stegt flæsk".to_string(),
            "Rugbrød".to_string(),
        ],
    }
}

fn seed_entry(store: &impl PersistentStore, key: &str, data: serde_json::Value, timestamp: u64) {
    let entry = CacheEntry::new(data, timestamp);
    store.set_item(key, &entry.to_json().unwrap()).unwrap();
}

// == Scenarios ==

#[test]
fn test_set_then_get_returns_same_object() {
    let (mut cache, _, _) = create_test_cache();
    let plan = sample_plan();

    cache.set("current_mealplan", &plan);

    assert_eq!(cache.get::<MealPlan>("current_mealplan"), Some(plan));
}

#[test]
fn test_expired_entry_is_absent_and_removed_from_persistent_tier() {
    let (mut cache, store, clock) = create_test_cache();

    cache.set("x", "v");
    clock.set(301_000);

    assert_eq!(cache.get::<String>("x"), None);
    assert!(!store.keys().unwrap().contains(&"mealplanner_x".to_string()));
}

#[test]
fn test_persistent_hit_is_promoted_and_survives_storage_outage() {
    let (mut cache, store, clock) = create_test_cache();
    seed_entry(&store, "mealplanner_history", serde_json::json!(["week 1", "week 2"]), 0);
    clock.set(60_000);

    let first: Option<Vec<String>> = cache.get("history");
    assert_eq!(first, Some(vec!["week 1".to_string(), "week 2".to_string()]));

    store.fail_reads(true);
    let second: Option<Vec<String>> = cache.get("history");
    assert_eq!(second, first);
}

#[test]
fn test_corrupt_persistent_text_reads_as_absent() {
    let (mut cache, store, _) = create_test_cache();
    store
        .set_item("mealplanner_history", "{\"data\": [1, 2, ")
        .unwrap();

    assert_eq!(cache.get::<Vec<u32>>("history"), None);
    assert!(store.get_item("mealplanner_history").unwrap().is_none());
}

#[test]
fn test_clear_spares_other_namespaces() {
    let (mut cache, store, _) = create_test_cache();
    store.set_item("other_app_key", "untouched").unwrap();

    cache.set("a", &1);
    cache.clear();

    assert_eq!(cache.get::<i32>("a"), None);
    assert_eq!(
        store.get_item("other_app_key").unwrap().as_deref(),
        Some("untouched")
    );
}

// == Properties ==

#[test]
fn test_fresh_up_to_and_including_window() {
    let (mut cache, _, clock) = create_test_cache();
    cache.set("k", "v");

    clock.set(WINDOW);
    assert_eq!(cache.get::<String>("k").as_deref(), Some("v"));

    clock.set(WINDOW + 1);
    assert_eq!(cache.get::<String>("k"), None);
}

#[test]
fn test_invalidate_twice_is_harmless() {
    let (mut cache, _, _) = create_test_cache();
    cache.set("k", "v");

    cache.invalidate("k");
    assert_eq!(cache.get::<String>("k"), None);
    cache.invalidate("k");
    assert_eq!(cache.get::<String>("k"), None);
}

#[test]
fn test_read_failure_falls_back_to_fast_tier() {
    let (mut cache, store, _) = create_test_cache();
    cache.set("profile", "anna");
    store.fail_reads(true);

    assert_eq!(cache.get::<String>("profile").as_deref(), Some("anna"));
    assert_eq!(cache.get::<String>("unknown"), None);
    assert_eq!(cache.stats().storage_errors, 1);
}

#[test]
fn test_write_failure_keeps_value_in_memory() {
    let (mut cache, store, _) = create_test_cache();
    store.fail_writes(true);

    cache.set("current_mealplan", &sample_plan());

    assert_eq!(cache.get::<MealPlan>("current_mealplan"), Some(sample_plan()));
    assert!(store.inner.is_empty());
}

#[test]
fn test_every_operation_survives_total_storage_failure() {
    let (mut cache, store, _) = create_test_cache();
    store.fail_reads(true);
    store.fail_writes(true);

    cache.set("k", &42);
    assert_eq!(cache.get::<i32>("k"), Some(42));
    cache.invalidate("k");
    cache.clear();
    assert_eq!(cache.purge_expired(), 0);
    assert_eq!(cache.get::<i32>("k"), None);
    assert!(cache.stats().storage_errors > 0);
}

#[test]
fn test_separate_instances_do_not_share_fast_tier() {
    let store = MemoryStore::new();
    let clock = ManualClock::new(0);
    let mut a = CacheService::new(store.clone()).with_clock(clock.clone());
    let mut b = CacheService::new(MemoryStore::new()).with_clock(clock);

    a.set("k", "only in a");

    assert_eq!(b.get::<String>("k"), None);
    assert!(b.is_empty());
}

// == Persistence Across Restarts ==

#[test]
fn test_file_store_survives_restart() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("cache.json");
    let clock = ManualClock::new(0);

    {
        let mut cache = CacheService::new(FileStore::new(path.clone())).with_clock(clock.clone());
        cache.set("current_mealplan", &sample_plan());
    }

    clock.set(120_000);
    let mut restarted = CacheService::new(FileStore::new(path.clone())).with_clock(clock.clone());
    assert!(restarted.is_empty());
    assert_eq!(
        restarted.get::<MealPlan>("current_mealplan"),
        Some(sample_plan())
    );
    assert_eq!(restarted.stats().persistent_hits, 1);

    clock.set(WINDOW + 1);
    let mut late = CacheService::new(FileStore::new(path)).with_clock(clock);
    assert_eq!(late.get::<MealPlan>("current_mealplan"), None);
}

#[test]
fn test_file_store_shares_file_with_other_data() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("cache.json");
    std::fs::write(&path, r#"{"theme":"dark","lang":"da"}"#).unwrap();

    let mut cache = CacheService::new(FileStore::new(path.clone()));
    cache.set("history", &vec![1, 2, 3]);
    cache.clear();

    let store = FileStore::new(path);
    let mut keys = store.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["lang".to_string(), "theme".to_string()]);
}

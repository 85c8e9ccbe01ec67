//! Meal Planner Cache - client-side read-through cache
//!
//! Caches remote reads such as the current meal plan and the history list
//! in an in-memory tier backed by a persistent key/value store. Entries
//! expire after a fixed window and are evicted lazily on read.

pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod storage;

pub use cache::{CacheEntry, CacheService, CacheStats, SharedCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, StorageError};
pub use storage::{FileStore, MemoryStore, PersistentStore};

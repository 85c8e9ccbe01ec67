//! Cache Module
//!
//! Two-tier caching with lazy time-based expiry: an in-memory fast tier in
//! front of a persistent key/value store.

mod entry;
mod service;
mod shared;
mod stats;


// Re-export public types
pub use entry::CacheEntry;
pub use service::CacheService;
pub use shared::SharedCache;
pub use stats::CacheStats;

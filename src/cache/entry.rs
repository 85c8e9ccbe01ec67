//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and their persisted text form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// == Cache Entry ==
/// A cached payload stamped with its write time.
///
/// Persisted as `{"data": <payload>, "timestamp": <ms>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// The cached payload
    pub data: Value,
    /// Write timestamp (Unix milliseconds). Must be a non-negative integer;
    /// floats or negatives from other writers fail to decode and are treated as corrupt.
    pub timestamp: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry written at `now_ms`.
    pub fn new(data: Value, now_ms: u64) -> Self {
        Self {
            data,
            timestamp: now_ms,
        }
    }

    // == Age ==
    /// Milliseconds since the entry was written. A clock behind the
    /// timestamp gives an age of zero.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.timestamp)
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `window_ms`.
    ///
    /// Boundary condition: an entry whose age equals the window exactly is
    /// still live. It expires one millisecond later.
    pub fn is_expired(&self, now_ms: u64, window_ms: u64) -> bool {
        self.age_ms(now_ms) > window_ms
    }

    // == Remaining ==
    /// Milliseconds left before the entry expires, zero once expired.
    pub fn remaining_ms(&self, now_ms: u64, window_ms: u64) -> u64 {
        window_ms.saturating_sub(self.age_ms(now_ms))
    }

    // == Text Form ==
    /// Encodes the entry for the persistent tier.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decodes an entry read from the persistent tier.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

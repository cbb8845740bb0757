//! Cache Entry Module
//!
//! Defines a single cached upstream response with its TTL.

use std::time::Duration;

use serde_json::Value;

// == Cache Entry ==
/// A previously fetched response and the time it was stored.
///
/// Entries are replaced on write, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Request fingerprint the entry was stored under
    pub key: String,
    /// The upstream payload
    pub value: Value,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Time to live in milliseconds
    pub ttl_ms: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with `now_ms`.
    pub fn new(key: String, value: Value, now_ms: u64, ttl: Duration) -> Self {
        Self {
            key,
            value,
            created_at: now_ms,
            ttl_ms: ttl.as_millis() as u64,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is valid while `now - created_at < ttl`, so it expires the
    /// instant the full TTL has elapsed. A clock that went backwards reads
    /// as zero elapsed time.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at) >= self.ttl_ms
    }
}

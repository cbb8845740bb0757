//! Cache Store Module
//!
//! Response cache combining HashMap storage with TTL expiration and an
//! optional LRU size bound.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, LruTracker};
use crate::clock::SharedClock;

// == Cache Store ==
/// TTL cache of upstream responses keyed by request fingerprint.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance statistics
    stats: CacheStats,
    /// Maximum number of entries, 0 = unbounded
    max_entries: usize,
    clock: SharedClock,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `max_entries` - LRU bound, 0 disables it
    /// * `clock` - Time source used for stamping and expiry
    pub fn new(max_entries: usize, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            stats: CacheStats::new(),
            max_entries,
            clock,
        }
    }

    // == Put ==
    /// Stores a value under `key`, stamping the current time.
    ///
    /// An existing entry for the key is replaced and its TTL restarts.
    /// When the store is bounded and full, inserting a new key first drops
    /// expired entries and only then evicts the least recently used one.
    pub fn put(&mut self, key: &str, value: Value, ttl: Duration) {
        let is_overwrite = self.entries.contains_key(key);

        if !is_overwrite && self.is_full() {
            self.sweep_expired();
        }

        if !is_overwrite && self.is_full() {
            if let Some(evicted) = self.lru.evict_oldest() {
                debug!(key = %evicted, "evicting least recently used entry");
                self.entries.remove(&evicted);
                self.stats.record_eviction();
            }
        }

        let entry = CacheEntry::new(key.to_string(), value, self.clock.now_ms(), ttl);
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);
        self.stats.set_total_entries(self.entries.len());
    }

    // == Get ==
    /// Returns the stored value if present and unexpired.
    ///
    /// An expired entry counts as a miss and is removed on the spot.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let now = self.clock.now_ms();

        let expired = match self.entries.get(key) {
            None => {
                self.stats.record_miss();
                return None;
            }
            Some(entry) => entry.is_expired(now),
        };

        if expired {
            self.remove(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.lru.touch(key);
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    // == Sweep Expired ==
    /// Removes all expired entries and returns how many were dropped.
    ///
    /// Running it again without new entries or clock movement is a no-op.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }

        self.stats.record_expirations(expired_keys.len());
        expired_keys.len()
    }

    /// Drops every entry and returns how many were held.
    ///
    /// Statistics counters are kept.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.stats.set_total_entries(0);
        removed
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_full(&self) -> bool {
        self.max_entries > 0 && self.entries.len() >= self.max_entries
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
        self.lru.remove(key);
        self.stats.set_total_entries(self.entries.len());
    }
}

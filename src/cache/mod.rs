//! Cache Module
//!
//! In-memory response cache with TTL expiration and an optional LRU bound.

mod entry;
pub mod key;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

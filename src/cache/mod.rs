//! Cache module for storing weather data between calls
//!
//! This module provides a namespaced TTL cache over a pluggable key/value
//! store. Entries are JSON envelopes carrying their write time and
//! time-to-live; expired or unreadable entries are treated as misses and
//! evicted. A per-key lock table lets callers make a read-then-write
//! sequence atomic with respect to other callers of the same key.

mod lock;
mod manager;
mod store;

pub use lock::KeyLocks;
pub use manager::{cache_key, CacheInfo, DataClass, TtlCache, CACHE_NAMESPACE};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

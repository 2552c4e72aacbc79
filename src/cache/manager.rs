//! Namespaced TTL cache over a key/value store
//!
//! Provides a `TtlCache` that stores serializable data as JSON envelopes with
//! the write time and time-to-live, evicting entries that are expired or no
//! longer parse. Storage failures are logged and never reach the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::store::KeyValueStore;
use crate::clock::Clock;
use crate::data::Coordinate;

/// Prefix scoping every key written by the cache
pub const CACHE_NAMESPACE: &str = "weather-app-cache";

/// Classes of cached data, each with a fixed time-to-live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataClass {
    /// Current observation, cached for 5 minutes
    Current,
    /// Derived hourly/daily forecast, cached for 15 minutes
    Forecast,
}

impl DataClass {
    /// Key component for this class
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "weather",
            Self::Forecast => "forecast",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Self::Current => Duration::from_secs(5 * 60),
            Self::Forecast => Duration::from_secs(15 * 60),
        }
    }
}

/// Derives the cache key for a data class at a coordinate
///
/// Coordinates are formatted to two decimals, so nearby queries share an
/// entry: `cache_key(DataClass::Current, (37.5665, 126.978))` is
/// `"weather-37.57-126.98"`.
pub fn cache_key(class: DataClass, coord: Coordinate) -> String {
    let rounded = coord.rounded();
    format!("{}-{:.2}-{:.2}", class.as_str(), rounded.lat, rounded.lon)
}

/// Envelope stored for each cache entry
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry<T> {
    /// The cached data
    data: T,
    /// Write time in milliseconds since the Unix epoch
    written_at: i64,
    /// Time-to-live in milliseconds
    ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.written_at) < self.ttl_ms.min(i64::MAX as u64) as i64
    }
}

/// Just the write time of an entry, for scanning without decoding data
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntryStamp {
    written_at: i64,
}

/// Summary of the cache contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheInfo {
    /// Number of namespaced entries, including unreadable ones
    pub count: usize,
    /// Total size of the stored values in bytes
    pub total_size_bytes: usize,
    /// Key (without namespace) of the entry written first
    pub oldest_key: Option<String>,
    /// Key (without namespace) of the entry written last
    pub newest_key: Option<String>,
}

impl CacheInfo {
    /// Total size rounded to whole kilobytes
    pub fn total_size_kb(&self) -> usize {
        (self.total_size_bytes as f64 / 1024.0).round() as usize
    }
}

/// Expiring cache of JSON values under a fixed namespace
#[derive(Debug, Clone)]
pub struct TtlCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
}

impl TtlCache {
    /// Creates a cache using the default namespace
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_namespace(store, clock, CACHE_NAMESPACE)
    }

    /// Creates a cache scoped to a custom namespace
    pub fn with_namespace(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            clock,
            namespace: namespace.into(),
        }
    }

    fn prefix(&self) -> String {
        format!("{}-", self.namespace)
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix(), key)
    }

    /// Keys in the store that belong to this cache, sorted
    fn namespaced_keys(&self) -> Vec<String> {
        let prefix = self.prefix();
        match self.store.keys() {
            Ok(keys) => {
                let mut keys: Vec<String> =
                    keys.into_iter().filter(|k| k.starts_with(&prefix)).collect();
                keys.sort();
                keys
            }
            Err(e) => {
                warn!(error = %e, "Failed to list cache keys");
                Vec::new()
            }
        }
    }

    fn now_ms(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Writes data under `key`, replacing any existing entry
    ///
    /// Failures (serialization, quota, I/O) are logged and otherwise ignored.
    pub fn set<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        let entry = CacheEntry {
            data,
            written_at: self.now_ms(),
            ttl_ms: ttl.as_millis().min(u64::MAX as u128) as u64,
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(&self.namespaced(key), &json) {
            warn!(key, error = %e, "Failed to write cache entry");
        }
    }

    /// Reads the data under `key` if it exists, parses and has not expired
    ///
    /// Expired and unparseable entries are evicted as a side effect.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full_key = self.namespaced(key);
        let raw = match self.store.get(&full_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "Evicting unreadable cache entry");
                self.delete_quietly(&full_key);
                return None;
            }
        };

        if !entry.is_valid_at(self.now_ms()) {
            debug!(key, "Evicting expired cache entry");
            self.delete_quietly(&full_key);
            return None;
        }

        Some(entry.data)
    }

    /// Deletes the entry under `key`
    pub fn remove(&self, key: &str) {
        self.delete_quietly(&self.namespaced(key));
    }

    fn delete_quietly(&self, full_key: &str) {
        if let Err(e) = self.store.delete(full_key) {
            warn!(key = full_key, error = %e, "Failed to delete cache entry");
        }
    }

    /// Deletes every entry in this cache's namespace
    ///
    /// Returns the number of entries removed. Keys outside the namespace are
    /// left alone.
    pub fn clear_all(&self) -> usize {
        let mut removed = 0;
        for key in self.namespaced_keys() {
            match self.store.delete(&key) {
                Ok(()) => removed += 1,
                Err(e) => warn!(key, error = %e, "Failed to delete cache entry"),
            }
        }
        debug!(removed, "Cleared cache");
        removed
    }

    /// Scans the namespace and summarizes it
    pub fn info(&self) -> CacheInfo {
        let prefix = self.prefix();
        let mut info = CacheInfo::default();
        let mut oldest: Option<(i64, String)> = None;
        let mut newest: Option<(i64, String)> = None;

        for key in self.namespaced_keys() {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                // Deleted since the key listing
                Ok(None) => continue,
                Err(e) => {
                    warn!(key, error = %e, "Failed to read cache entry");
                    info.count += 1;
                    continue;
                }
            };
            info.count += 1;
            info.total_size_bytes += raw.len();

            let Ok(stamp) = serde_json::from_str::<EntryStamp>(&raw) else {
                continue;
            };
            let short_key = key.strip_prefix(&prefix).unwrap_or(&key).to_string();

            if oldest.as_ref().map_or(true, |(t, _)| stamp.written_at < *t) {
                oldest = Some((stamp.written_at, short_key.clone()));
            }
            if newest.as_ref().map_or(true, |(t, _)| stamp.written_at > *t) {
                newest = Some((stamp.written_at, short_key));
            }
        }

        info.oldest_key = oldest.map(|(_, key)| key);
        info.newest_key = newest.map(|(_, key)| key);
        info
    }
}

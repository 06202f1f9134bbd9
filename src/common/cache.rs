//! In-memory cache for storing key-value pairs.
//!
//! Uses moka's concurrent cache implementation.

use moka::sync::Cache;

/// Thread-safe in-memory cache with bounded capacity.
///
/// Used for the per-run environment, per-node outputs, and the engine's
/// table of live runs. LRU eviction applies when capacity is exceeded.
#[derive(Clone)]
pub struct MemCache<K, V> {
    entries: Cache<K, V>,
}

impl<K, V> MemCache<K, V>
where
    K: std::hash::Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity as u64),
        }
    }

    pub fn set(
        &self,
        key: K,
        value: V,
    ) {
        self.entries.insert(key, value);
    }

    pub fn get(
        &self,
        key: &K,
    ) -> Option<V> {
        self.entries.get(key)
    }

    pub fn remove(
        &self,
        key: &K,
    ) {
        self.entries.remove(key);
    }

    pub fn iter(&self) -> moka::sync::Iter<'_, K, V> {
        self.entries.iter()
    }
}

//! Bounded backing store on `moka::sync::Cache`
//!
//! Entries may be evicted by capacity or expire after `time_to_live`. The
//! lookup cache treats a vanished slot as a miss and falls back to its
//! callback, so eviction never returns stale data.

use std::hash::Hash;
use std::time::Duration;

use entitylookup_core::{BackingStore, LookupResult};
use moka::sync::Cache;

/// Sizing and expiry for a [`MokaStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MokaStoreConfig {
    /// Maximum number of entries; unbounded when `None`
    pub max_capacity: Option<u64>,

    /// Time-to-live for each entry; no expiry when `None`
    pub time_to_live: Option<Duration>,
}

impl MokaStoreConfig {
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self { max_capacity: Some(max_capacity), time_to_live: None }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.time_to_live = Some(ttl);
        self
    }
}

pub struct MokaStore<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    cache: Cache<K, V>,
    config: MokaStoreConfig,
}

impl<K, V> MokaStore<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(config: MokaStoreConfig) -> Self {
        let mut builder = Cache::builder();
        if let Some(max_capacity) = config.max_capacity {
            builder = builder.max_capacity(max_capacity);
        }
        if let Some(ttl) = config.time_to_live {
            builder = builder.time_to_live(ttl);
        }

        Self { cache: builder.build(), config }
    }

    pub fn config(&self) -> MokaStoreConfig {
        self.config
    }

    /// Approximate entry count after flushing pending maintenance
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl<K, V> std::fmt::Debug for MokaStore<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaStore")
            .field("config", &self.config)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl<K, V> BackingStore<K, V> for MokaStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> LookupResult<Option<V>> {
        Ok(self.cache.get(key))
    }

    fn put(&self, key: K, value: V) -> LookupResult<()> {
        self.cache.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> LookupResult<()> {
        self.cache.invalidate(key);
        Ok(())
    }

    fn contains(&self, key: &K) -> LookupResult<bool> {
        Ok(self.cache.contains_key(key))
    }

    fn clear(&self) -> LookupResult<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
        Ok(())
    }

    fn keys(&self) -> LookupResult<Vec<K>> {
        Ok(self.cache.iter().map(|(key, _)| K::clone(&key)).collect())
    }
}

//! Unbounded backing store on `DashMap`

use std::hash::Hash;

use dashmap::DashMap;
use entitylookup_core::{BackingStore, LookupResult};

/// Sharded concurrent map; entries live until removed or cleared
#[derive(Debug)]
pub struct ConcurrentMapStore<K, V>
where
    K: Hash + Eq,
{
    entries: DashMap<K, V>,
}

impl<K, V> Default for ConcurrentMapStore<K, V>
where
    K: Hash + Eq,
{
    fn default() -> Self {
        Self { entries: DashMap::new() }
    }
}

impl<K, V> ConcurrentMapStore<K, V>
where
    K: Hash + Eq,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> BackingStore<K, V> for ConcurrentMapStore<K, V>
where
    K: Hash + Eq + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> LookupResult<Option<V>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, key: K, value: V) -> LookupResult<()> {
        self.entries.insert(key, value);
        Ok(())
    }

    fn remove(&self, key: &K) -> LookupResult<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn contains(&self, key: &K) -> LookupResult<bool> {
        Ok(self.entries.contains_key(key))
    }

    fn clear(&self) -> LookupResult<()> {
        self.entries.clear();
        Ok(())
    }

    fn keys(&self) -> LookupResult<Vec<K>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }
}

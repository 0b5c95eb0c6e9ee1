//! Port interfaces consumed by the lookup engine

use crate::errors::LookupResult;

/// Primary key paired with its (possibly null) value
pub type EntityPair<K, V> = (K, Option<V>);

/// Flat key/value store backing one or more cache regions
///
/// Implementations provide their own concurrency; the lookup engine holds
/// no locks around store calls.
pub trait BackingStore<K, V>: Send + Sync {
    fn get(&self, key: &K) -> LookupResult<Option<V>>;

    fn put(&self, key: K, value: V) -> LookupResult<()>;

    fn remove(&self, key: &K) -> LookupResult<()>;

    fn contains(&self, key: &K) -> LookupResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Drop every entry, whichever region wrote it
    fn clear(&self) -> LookupResult<()>;

    /// Snapshot of the keys currently held
    fn keys(&self) -> LookupResult<Vec<K>>;
}

/// Authoritative data access for one entity type
///
/// The cache calls these on a miss and on every mutation. Implementations
/// typically wrap a DAO or repository.
pub trait EntityLookupCallback<K, V, VK>: Send + Sync {
    /// Derive the secondary key for a value, if it has one
    fn get_value_key(&self, value: &V) -> Option<VK>;

    /// Resolve an entity by primary key.
    ///
    /// The returned key may differ from `key` when the source canonicalises it.
    fn find_by_key(&self, key: &K) -> LookupResult<Option<EntityPair<K, V>>>;

    fn find_by_value(&self, value: Option<&V>) -> LookupResult<Option<EntityPair<K, V>>>;

    /// Persist a new entity and return its key
    fn create_value(&self, value: Option<V>) -> LookupResult<EntityPair<K, V>>;

    /// Returns the number of rows updated
    fn update_value(&self, key: &K, value: Option<&V>) -> LookupResult<u64>;

    /// Returns the number of rows deleted
    fn delete_by_key(&self, key: &K) -> LookupResult<u64>;

    /// Returns the number of rows deleted
    fn delete_by_value(&self, value: Option<&V>) -> LookupResult<u64>;

    /// Whether the cache should maintain the value → key index
    fn is_secondary_key_enabled(&self) -> bool {
        true
    }
}

//! The lookup engine
//!
//! # Store layout
//!
//! For a cache in region `R`, an entity `(k, v)` whose value key is `vk`
//! occupies two slots:
//!
//! | Store key | Slot |
//! |-----------|------|
//! | `Primary { R, k }` | `Found(v)` or `NullValue` |
//! | `Secondary { R, vk }` | `Key(k)` |
//!
//! A resolved miss is memoized as `NotFound` under whichever key was looked
//! up. Null values are indexed under [`ValueKey::Null`].
//!
//! # Example
//!
//! ```rust,ignore
//! let cache = EntityLookupCache::with_region(Some(store), "ORDERS_REGION", Arc::new(dao));
//!
//! if let Some((id, order)) = cache.get_by_key(&42)? {
//!     // second call is served from the store
//! }
//! let (id, _) = cache.get_or_create_by_value(Some(order))?;
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::keys::{NamespacedKey, ValueKey, DEFAULT_REGION};
use super::ports::{BackingStore, EntityLookupCallback, EntityPair};
use super::slot::CacheSlot;
use super::stats::{LookupStats, MetricsCollector};
use super::{LookupKey, LookupValue};
use crate::errors::{LookupError, LookupResult};

/// Store handle as held by a cache
pub type SharedStore<K, V, VK> = Arc<dyn BackingStore<NamespacedKey<K, VK>, CacheSlot<K, V>>>;

/// Callback handle as held by a cache
pub type SharedCallback<K, V, VK> = Arc<dyn EntityLookupCallback<K, V, VK>>;

type Store<K, V, VK> = dyn BackingStore<NamespacedKey<K, VK>, CacheSlot<K, V>>;

/// Read-through cache indexing entities by key and by value
///
/// Without a store every operation passes straight to the callback and the
/// cache-only operations are no-ops. The cache holds no locks of its own;
/// concurrent callers race last-writer-wins on the store.
pub struct EntityLookupCache<K, V, VK> {
    store: Option<SharedStore<K, V, VK>>,
    callback: SharedCallback<K, V, VK>,
    region: String,
    secondary_key_enabled: bool,
    metrics: MetricsCollector,
}

impl<K, V, VK> fmt::Debug for EntityLookupCache<K, V, VK> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLookupCache")
            .field("region", &self.region)
            .field("enabled", &self.store.is_some())
            .field("secondary_key_enabled", &self.secondary_key_enabled)
            .finish_non_exhaustive()
    }
}

impl<K, V, VK> EntityLookupCache<K, V, VK>
where
    K: LookupKey,
    V: LookupValue,
    VK: LookupKey,
{
    /// Cache without a store; every call reaches the callback
    pub fn pass_through(callback: SharedCallback<K, V, VK>) -> Self {
        Self::with_region(None, DEFAULT_REGION, callback)
    }

    /// Cache over `store` in the default region
    pub fn new(store: SharedStore<K, V, VK>, callback: SharedCallback<K, V, VK>) -> Self {
        Self::with_region(Some(store), DEFAULT_REGION, callback)
    }

    /// Cache over an optional store in an explicit region
    ///
    /// Caches sharing a store must use distinct regions.
    pub fn with_region(
        store: Option<SharedStore<K, V, VK>>,
        region: impl Into<String>,
        callback: SharedCallback<K, V, VK>,
    ) -> Self {
        let secondary_key_enabled = callback.is_secondary_key_enabled();
        Self {
            store,
            callback,
            region: region.into(),
            secondary_key_enabled,
            metrics: MetricsCollector::default(),
        }
    }

    /// Override whether the value → key index is maintained
    pub fn with_secondary_key_enabled(mut self, enabled: bool) -> Self {
        self.secondary_key_enabled = enabled;
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Whether a store is configured
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn is_secondary_key_enabled(&self) -> bool {
        self.secondary_key_enabled
    }

    pub fn stats(&self) -> LookupStats {
        self.metrics.snapshot()
    }

    pub fn reset_stats(&self) {
        self.metrics.reset();
    }

    /// Look up an entity by primary key, consulting the callback on a miss.
    ///
    /// The returned key is the one the callback reported, which may be a
    /// canonical form of `key`.
    pub fn get_by_key(&self, key: &K) -> LookupResult<Option<EntityPair<K, V>>> {
        let Some(store) = self.store.as_deref() else {
            return self.find_by_key(key);
        };
        self.lookup_by_key(store, key, true)
    }

    /// Primary-index lookup; `counted` is false for the second hop of a
    /// value lookup, which was already counted once.
    fn lookup_by_key(
        &self,
        store: &Store<K, V, VK>,
        key: &K,
        counted: bool,
    ) -> LookupResult<Option<EntityPair<K, V>>> {
        let cache_key = self.primary_key(key.clone());
        match store.get(&cache_key)? {
            Some(CacheSlot::NotFound) => {
                if counted {
                    self.metrics.record_negative_hit();
                }
                Ok(None)
            }
            Some(CacheSlot::NullValue) => {
                if counted {
                    self.metrics.record_hit();
                }
                Ok(Some((key.clone(), None)))
            }
            Some(CacheSlot::Found(value)) => {
                if counted {
                    self.metrics.record_hit();
                }
                Ok(Some((key.clone(), Some(value))))
            }
            Some(slot) => Err(self.unexpected_slot(&slot, "primary")),
            None => {
                if counted {
                    self.metrics.record_miss();
                }
                tracing::debug!(
                    region = %self.region,
                    key = ?key,
                    "Cache miss, resolving key via callback"
                );

                match self.find_by_key(key)? {
                    None => {
                        self.put_slot(store, cache_key, CacheSlot::NotFound)?;
                        Ok(None)
                    }
                    Some((found_key, value)) => {
                        self.cache_entity(store, &found_key, value.as_ref())?;
                        Ok(Some((found_key, value)))
                    }
                }
            }
        }
    }

    /// Whether the key is known to the cache.
    ///
    /// A memoized "not found" counts as known. Without a store this asks
    /// the callback instead.
    pub fn contains_key(&self, key: &K) -> LookupResult<bool> {
        match self.store.as_deref() {
            None => Ok(self.find_by_key(key)?.is_some()),
            Some(store) => store.contains(&self.primary_key(key.clone())),
        }
    }

    /// Look up an entity by value through the secondary index.
    ///
    /// Values without a derivable key cannot be indexed and always reach
    /// the callback.
    pub fn get_by_value(&self, value: Option<&V>) -> LookupResult<Option<EntityPair<K, V>>> {
        self.require_secondary_keys()?;

        let Some(store) = self.store.as_deref() else {
            return self.find_by_value(value);
        };
        let Some(value_key) = self.value_key_of(value) else {
            return self.find_by_value(value);
        };

        let cache_key = self.secondary_key(value_key);
        match store.get(&cache_key)? {
            Some(CacheSlot::NotFound) => {
                self.metrics.record_negative_hit();
                Ok(None)
            }
            Some(CacheSlot::Key(key)) => {
                self.metrics.record_hit();
                self.lookup_by_key(store, &key, false)
            }
            Some(slot) => Err(self.unexpected_slot(&slot, "secondary")),
            None => {
                self.metrics.record_miss();
                tracing::debug!(region = %self.region, "Cache miss, resolving value via callback");

                match self.find_by_value(value)? {
                    None => {
                        self.put_slot(store, cache_key, CacheSlot::NotFound)?;
                        Ok(None)
                    }
                    Some((key, found)) => {
                        self.put_slot(store, cache_key, CacheSlot::Key(key.clone()))?;
                        self.put_slot(
                            store,
                            self.primary_key(key.clone()),
                            CacheSlot::from_value(found.clone()),
                        )?;
                        Ok(Some((key, found)))
                    }
                }
            }
        }
    }

    /// Find the entity holding `value`, creating it when absent.
    ///
    /// A cached secondary entry is trusted as is: the returned pair carries
    /// the caller's `value` and the callback is not consulted.
    pub fn get_or_create_by_value(&self, value: Option<V>) -> LookupResult<EntityPair<K, V>> {
        self.require_secondary_keys()?;

        let Some(store) = self.store.as_deref() else {
            return self.find_or_create(value);
        };

        let Some(value_key) = self.value_key_of(value.as_ref()) else {
            if let Some(pair) = self.find_by_value(value.as_ref())? {
                return Ok(pair);
            }
            let (key, created) = self.create_value(value)?;
            let slot = CacheSlot::from_value(created.clone());
            self.put_slot(store, self.primary_key(key.clone()), slot)?;
            return Ok((key, created));
        };

        let cache_key = self.secondary_key(value_key);
        match store.get(&cache_key)? {
            Some(CacheSlot::Key(key)) => {
                self.metrics.record_hit();
                return Ok((key, value));
            }
            Some(CacheSlot::NotFound) => self.metrics.record_negative_hit(),
            Some(slot) => return Err(self.unexpected_slot(&slot, "secondary")),
            None => self.metrics.record_miss(),
        }

        tracing::debug!(region = %self.region, "Resolving or creating value via callback");
        let pair = self.find_or_create(value.clone())?;
        self.put_slot(store, cache_key, CacheSlot::Key(pair.0.clone()))?;
        self.put_slot(store, self.primary_key(pair.0.clone()), CacheSlot::from_value(value))?;
        Ok(pair)
    }

    /// Update the entity's value through the callback and re-index it.
    ///
    /// Both indices for `key` are evicted first. When the callback reports
    /// no updated rows the key is left uncached.
    pub fn update_value(&self, key: &K, value: Option<V>) -> LookupResult<u64> {
        let Some(store) = self.store.as_deref() else {
            self.metrics.record_callback();
            return self.callback.update_value(key, value.as_ref());
        };

        self.remove_by_key(key)?;

        self.metrics.record_callback();
        let updated = self.callback.update_value(key, value.as_ref())?;
        if updated == 0 {
            return Ok(0);
        }

        self.cache_entity(store, key, value.as_ref())?;
        Ok(updated)
    }

    /// Evict the entity from both indices and delete it through the callback.
    pub fn delete_by_key(&self, key: &K) -> LookupResult<u64> {
        self.remove_by_key(key)?;
        self.metrics.record_callback();
        self.callback.delete_by_key(key)
    }

    /// Evict the entity holding `value` and delete it through the callback.
    ///
    /// Returns `0` without touching the callback when secondary keys are
    /// disabled.
    pub fn delete_by_value(&self, value: Option<&V>) -> LookupResult<u64> {
        if !self.secondary_key_enabled {
            return Ok(0);
        }
        self.remove_by_value(value)?;
        self.metrics.record_callback();
        self.callback.delete_by_value(value)
    }

    /// Write an entity into both indices without touching the callback.
    pub fn set_value(&self, key: K, value: Option<V>) -> LookupResult<()> {
        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };
        self.remove_by_key(&key)?;
        self.cache_entity(store, &key, value.as_ref())
    }

    /// Cached value for `key`, if any.
    ///
    /// A null value, a memoized "not found" and an uncached key all read as `None`.
    pub fn get_value(&self, key: &K) -> LookupResult<Option<V>> {
        let Some(store) = self.store.as_deref() else {
            return Ok(None);
        };
        match store.get(&self.primary_key(key.clone()))? {
            Some(CacheSlot::Found(value)) => Ok(Some(value)),
            Some(CacheSlot::NullValue | CacheSlot::NotFound) | None => Ok(None),
            Some(slot) => Err(self.unexpected_slot(&slot, "primary")),
        }
    }

    /// Cached primary key for a value key, if any.
    pub fn get_key(&self, value_key: &VK) -> LookupResult<Option<K>> {
        if !self.secondary_key_enabled {
            return Ok(None);
        }
        let Some(store) = self.store.as_deref() else {
            return Ok(None);
        };
        match store.get(&self.secondary_key(ValueKey::Key(value_key.clone())))? {
            Some(CacheSlot::Key(key)) => Ok(Some(key)),
            Some(CacheSlot::NotFound) | None => Ok(None),
            Some(slot) => Err(self.unexpected_slot(&slot, "secondary")),
        }
    }

    /// Evict `key` and the secondary entry of its cached value.
    pub fn remove_by_key(&self, key: &K) -> LookupResult<()> {
        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };

        let cache_key = self.primary_key(key.clone());
        match store.get(&cache_key)? {
            Some(CacheSlot::Found(value)) => {
                if let Some(value_key) = self.indexable_value_key(Some(&value)) {
                    self.remove_owned_secondary(store, value_key, key)?;
                }
            }
            // The null entry is shared by every null-valued entity
            Some(CacheSlot::NullValue) if self.secondary_key_enabled => {
                self.remove_owned_secondary(store, ValueKey::Null, key)?;
            }
            _ => {}
        }
        self.remove_slot(store, &cache_key)
    }

    /// Remove a secondary slot only while it still points at `key`.
    ///
    /// Another key may have been indexed under the same value key since.
    fn remove_owned_secondary(
        &self,
        store: &Store<K, V, VK>,
        value_key: ValueKey<VK>,
        key: &K,
    ) -> LookupResult<()> {
        let secondary = self.secondary_key(value_key);
        let owned = matches!(
            store.get(&secondary)?,
            Some(CacheSlot::Key(ref owner)) if owner == key
        );
        if owned {
            self.remove_slot(store, &secondary)?;
        }
        Ok(())
    }

    /// Evict the secondary entry for `value` and the primary entry it points at.
    pub fn remove_by_value(&self, value: Option<&V>) -> LookupResult<()> {
        self.require_secondary_keys()?;

        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };
        let Some(value_key) = self.value_key_of(value) else {
            return Ok(());
        };

        let cache_key = self.secondary_key(value_key);
        if let Some(CacheSlot::Key(key)) = store.get(&cache_key)? {
            self.remove_slot(store, &self.primary_key(key))?;
        }
        self.remove_slot(store, &cache_key)
    }

    /// Primary keys held by the store, whichever region wrote them.
    ///
    /// Caches sharing a store see each other's keys here; use
    /// [`region_primary_keys`](Self::region_primary_keys) for this cache's own.
    pub fn primary_keys(&self) -> LookupResult<HashSet<K>> {
        self.collect_primary_keys(None)
    }

    /// Primary keys written under this cache's region
    pub fn region_primary_keys(&self) -> LookupResult<HashSet<K>> {
        self.collect_primary_keys(Some(self.region.as_str()))
    }

    /// Value keys held by the store, whichever region wrote them.
    ///
    /// The null-value entry is not a value key and is skipped. Empty when
    /// secondary keys are disabled.
    pub fn secondary_keys(&self) -> LookupResult<HashSet<VK>> {
        self.collect_secondary_keys(None)
    }

    /// Value keys written under this cache's region
    pub fn region_secondary_keys(&self) -> LookupResult<HashSet<VK>> {
        self.collect_secondary_keys(Some(self.region.as_str()))
    }

    fn collect_primary_keys(&self, only_region: Option<&str>) -> LookupResult<HashSet<K>> {
        let Some(store) = self.store.as_deref() else {
            return Ok(HashSet::new());
        };
        Ok(store
            .keys()?
            .into_iter()
            .filter_map(|cache_key| match cache_key {
                NamespacedKey::Primary { region, key } if in_scope(&region, only_region) => {
                    Some(key)
                }
                _ => None,
            })
            .collect())
    }

    fn collect_secondary_keys(&self, only_region: Option<&str>) -> LookupResult<HashSet<VK>> {
        if !self.secondary_key_enabled {
            return Ok(HashSet::new());
        }
        let Some(store) = self.store.as_deref() else {
            return Ok(HashSet::new());
        };
        Ok(store
            .keys()?
            .into_iter()
            .filter_map(|cache_key| match cache_key {
                NamespacedKey::Secondary { region, value_key: ValueKey::Key(vk) }
                    if in_scope(&region, only_region) =>
                {
                    Some(vk)
                }
                _ => None,
            })
            .collect())
    }

    /// Clear the backing store.
    ///
    /// This drops the entries of every region sharing the store, not only
    /// this cache's.
    pub fn clear(&self) -> LookupResult<()> {
        let Some(store) = self.store.as_deref() else {
            return Ok(());
        };
        store.clear()?;
        tracing::debug!(region = %self.region, "Lookup cache store cleared");
        Ok(())
    }

    fn primary_key(&self, key: K) -> NamespacedKey<K, VK> {
        NamespacedKey::primary(self.region.as_str(), key)
    }

    fn secondary_key(&self, value_key: ValueKey<VK>) -> NamespacedKey<K, VK> {
        NamespacedKey::secondary(self.region.as_str(), value_key)
    }

    /// Value key of a value, `ValueKey::Null` for a null value.
    fn value_key_of(&self, value: Option<&V>) -> Option<ValueKey<VK>> {
        match value {
            None => Some(ValueKey::Null),
            Some(v) => self.callback.get_value_key(v).map(ValueKey::Key),
        }
    }

    /// Value key to index under, or `None` when nothing should be indexed.
    fn indexable_value_key(&self, value: Option<&V>) -> Option<ValueKey<VK>> {
        if self.secondary_key_enabled {
            self.value_key_of(value)
        } else {
            None
        }
    }

    fn require_secondary_keys(&self) -> LookupResult<()> {
        if self.secondary_key_enabled {
            Ok(())
        } else {
            Err(LookupError::SecondaryKeyDisabled(self.region.clone()))
        }
    }

    /// Write the secondary slot (when indexable) and then the primary slot.
    fn cache_entity(
        &self,
        store: &Store<K, V, VK>,
        key: &K,
        value: Option<&V>,
    ) -> LookupResult<()> {
        if let Some(value_key) = self.indexable_value_key(value) {
            self.put_slot(store, self.secondary_key(value_key), CacheSlot::Key(key.clone()))?;
        }
        self.put_slot(store, self.primary_key(key.clone()), CacheSlot::from_value(value.cloned()))
    }

    fn put_slot(
        &self,
        store: &Store<K, V, VK>,
        cache_key: NamespacedKey<K, VK>,
        slot: CacheSlot<K, V>,
    ) -> LookupResult<()> {
        tracing::trace!(key = %cache_key, slot = slot.kind(), "Lookup slot written");
        store.put(cache_key, slot)?;
        self.metrics.record_write();
        Ok(())
    }

    fn remove_slot(
        &self,
        store: &Store<K, V, VK>,
        cache_key: &NamespacedKey<K, VK>,
    ) -> LookupResult<()> {
        store.remove(cache_key)?;
        self.metrics.record_eviction();
        tracing::trace!(key = %cache_key, "Lookup slot evicted");
        Ok(())
    }

    fn unexpected_slot(&self, slot: &CacheSlot<K, V>, index: &str) -> LookupError {
        LookupError::corrupt_slot(&self.region, &format!("{} slot in {index} index", slot.kind()))
    }

    fn find_by_key(&self, key: &K) -> LookupResult<Option<EntityPair<K, V>>> {
        self.metrics.record_callback();
        self.callback.find_by_key(key)
    }

    fn find_by_value(&self, value: Option<&V>) -> LookupResult<Option<EntityPair<K, V>>> {
        self.metrics.record_callback();
        self.callback.find_by_value(value)
    }

    fn create_value(&self, value: Option<V>) -> LookupResult<EntityPair<K, V>> {
        self.metrics.record_callback();
        self.callback.create_value(value)
    }

    fn find_or_create(&self, value: Option<V>) -> LookupResult<EntityPair<K, V>> {
        if let Some(pair) = self.find_by_value(value.as_ref())? {
            return Ok(pair);
        }
        self.create_value(value)
    }
}

fn in_scope(region: &str, only_region: Option<&str>) -> bool {
    only_region.map_or(true, |only| only == region)
}

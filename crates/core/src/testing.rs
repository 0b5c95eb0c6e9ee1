//! Test doubles for lookup caches and the cache registry
//!
//! Shared by unit tests, the integration suites of this crate and of the
//! infrastructure crate, and the benchmarks.
//!
//! - [`InMemoryEntityDao`]: call-counting callback over an in-memory table
//! - [`InMemoryStore`]: `HashMap` backing store with failure injection
//! - [`InMemoryStoreProvider`]: provider handing out fresh `InMemoryStore`s

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use entitylookup_common::CommonError;
use parking_lot::{Mutex, RwLock};

use crate::errors::{LookupError, LookupResult};
use crate::lookup::{
    BackingStore, EntityLookupCallback, EntityPair, LookupKey, LookupValue, SharedStore,
};
use crate::registry::StoreProvider;

/// Fresh [`InMemoryStore`] behind a cache store handle
pub fn shared_store<K, V, VK>() -> SharedStore<K, V, VK>
where
    K: LookupKey,
    V: LookupValue,
    VK: LookupKey,
{
    Arc::new(InMemoryStore::new())
}

/// `HashMap` store guarded by a `RwLock`
#[derive(Debug)]
pub struct InMemoryStore<K, V> {
    entries: RwLock<HashMap<K, V>>,
    fail_next: Mutex<Option<CommonError>>,
    puts: AtomicU64,
}

impl<K, V> Default for InMemoryStore<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            fail_next: Mutex::new(None),
            puts: AtomicU64::new(0),
        }
    }
}

impl<K, V> InMemoryStore<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of `put` calls that reached the map
    pub fn put_count(&self) -> u64 {
        self.puts.load(Ordering::Relaxed)
    }

    /// Make the next store operation fail with `error`
    pub fn fail_next(&self, error: CommonError) {
        *self.fail_next.lock() = Some(error);
    }

    fn injected_failure(&self) -> LookupResult<()> {
        match self.fail_next.lock().take() {
            Some(error) => Err(LookupError::Common(error)),
            None => Ok(()),
        }
    }
}

impl<K, V> BackingStore<K, V> for InMemoryStore<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> LookupResult<Option<V>> {
        self.injected_failure()?;
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: K, value: V) -> LookupResult<()> {
        self.injected_failure()?;
        self.entries.write().insert(key, value);
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn remove(&self, key: &K) -> LookupResult<()> {
        self.injected_failure()?;
        self.entries.write().remove(key);
        Ok(())
    }

    fn contains(&self, key: &K) -> LookupResult<bool> {
        self.injected_failure()?;
        Ok(self.entries.read().contains_key(key))
    }

    fn clear(&self) -> LookupResult<()> {
        self.injected_failure()?;
        self.entries.write().clear();
        Ok(())
    }

    fn keys(&self) -> LookupResult<Vec<K>> {
        self.injected_failure()?;
        Ok(self.entries.read().keys().cloned().collect())
    }
}

/// Provider creating a new [`InMemoryStore`] for every region
#[derive(Debug, Default)]
pub struct InMemoryStoreProvider {
    disabled_regions: HashSet<String>,
    created: Mutex<Vec<String>>,
}

impl InMemoryStoreProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create no store for `region`
    pub fn with_disabled_region(mut self, region: impl Into<String>) -> Self {
        self.disabled_regions.insert(region.into());
        self
    }

    /// Regions a store was requested for, in request order
    pub fn created_regions(&self) -> Vec<String> {
        self.created.lock().clone()
    }
}

impl StoreProvider for InMemoryStoreProvider {
    fn create_store<K, V, VK>(&self, region: &str) -> LookupResult<Option<SharedStore<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        self.created.lock().push(region.to_string());
        if self.disabled_regions.contains(region) {
            return Ok(None);
        }
        Ok(Some(shared_store()))
    }
}

#[derive(Debug, Default)]
struct CallCounts {
    find_by_key: AtomicU64,
    find_by_value: AtomicU64,
    create: AtomicU64,
    update: AtomicU64,
    delete: AtomicU64,
}

/// Entity callback over an in-memory table keyed by `u64`
///
/// Every callback method counts its calls so tests can assert what the
/// cache served without reaching the source.
pub struct InMemoryEntityDao<V, VK> {
    rows: Mutex<BTreeMap<u64, Option<V>>>,
    aliases: HashMap<u64, u64>,
    next_id: AtomicU64,
    value_key: fn(&V) -> Option<VK>,
    secondary_key_enabled: bool,
    fail_next: Mutex<Option<CommonError>>,
    calls: CallCounts,
}

impl<V, VK> InMemoryEntityDao<V, VK>
where
    V: Clone + PartialEq + Send + Sync,
{
    /// Empty table deriving value keys with `value_key`
    pub fn new(value_key: fn(&V) -> Option<VK>) -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
            aliases: HashMap::new(),
            next_id: AtomicU64::new(1),
            value_key,
            secondary_key_enabled: true,
            fail_next: Mutex::new(None),
            calls: CallCounts::default(),
        }
    }

    /// Add a row
    pub fn with_row(self, id: u64, value: Option<V>) -> Self {
        self.insert(id, value);
        self
    }

    /// Resolve `alias` to `canonical` in `find_by_key`
    pub fn with_alias(mut self, alias: u64, canonical: u64) -> Self {
        self.aliases.insert(alias, canonical);
        self
    }

    /// Report secondary keys as disabled to the cache
    pub fn without_secondary_keys(mut self) -> Self {
        self.secondary_key_enabled = false;
        self
    }

    /// Write a row directly, bypassing any cache
    pub fn insert(&self, id: u64, value: Option<V>) {
        self.rows.lock().insert(id, value);
        self.next_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    /// Delete a row directly, bypassing any cache
    pub fn remove(&self, id: u64) -> Option<Option<V>> {
        self.rows.lock().remove(&id)
    }

    /// Current row for `id`; the outer `None` means no row
    pub fn row(&self, id: u64) -> Option<Option<V>> {
        self.rows.lock().get(&id).cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }

    /// Make the next callback call fail with `error`
    pub fn fail_next(&self, error: CommonError) {
        *self.fail_next.lock() = Some(error);
    }

    pub fn find_by_key_calls(&self) -> u64 {
        self.calls.find_by_key.load(Ordering::Relaxed)
    }

    pub fn find_by_value_calls(&self) -> u64 {
        self.calls.find_by_value.load(Ordering::Relaxed)
    }

    pub fn create_calls(&self) -> u64 {
        self.calls.create.load(Ordering::Relaxed)
    }

    pub fn update_calls(&self) -> u64 {
        self.calls.update.load(Ordering::Relaxed)
    }

    pub fn delete_calls(&self) -> u64 {
        self.calls.delete.load(Ordering::Relaxed)
    }

    pub fn total_calls(&self) -> u64 {
        self.find_by_key_calls()
            + self.find_by_value_calls()
            + self.create_calls()
            + self.update_calls()
            + self.delete_calls()
    }

    fn record(&self, counter: &AtomicU64) -> LookupResult<()> {
        counter.fetch_add(1, Ordering::Relaxed);
        match self.fail_next.lock().take() {
            Some(error) => Err(LookupError::Common(error)),
            None => Ok(()),
        }
    }
}

impl<V> InMemoryEntityDao<V, V>
where
    V: Clone + PartialEq + Send + Sync,
{
    /// Empty table whose values are their own value keys
    pub fn keyed_by_value() -> Self {
        Self::new(|value: &V| Some(value.clone()))
    }
}

impl<V, VK> EntityLookupCallback<u64, V, VK> for InMemoryEntityDao<V, VK>
where
    V: Clone + PartialEq + Send + Sync,
    VK: Send + Sync,
{
    fn get_value_key(&self, value: &V) -> Option<VK> {
        (self.value_key)(value)
    }

    fn find_by_key(&self, key: &u64) -> LookupResult<Option<EntityPair<u64, V>>> {
        self.record(&self.calls.find_by_key)?;
        let id = self.aliases.get(key).copied().unwrap_or(*key);
        Ok(self.rows.lock().get(&id).map(|value| (id, value.clone())))
    }

    fn find_by_value(&self, value: Option<&V>) -> LookupResult<Option<EntityPair<u64, V>>> {
        self.record(&self.calls.find_by_value)?;
        Ok(self
            .rows
            .lock()
            .iter()
            .find(|(_, row)| row.as_ref() == value)
            .map(|(id, row)| (*id, row.clone())))
    }

    fn create_value(&self, value: Option<V>) -> LookupResult<EntityPair<u64, V>> {
        self.record(&self.calls.create)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.lock().insert(id, value.clone());
        Ok((id, value))
    }

    fn update_value(&self, key: &u64, value: Option<&V>) -> LookupResult<u64> {
        self.record(&self.calls.update)?;
        match self.rows.lock().get_mut(key) {
            Some(row) => {
                *row = value.cloned();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_by_key(&self, key: &u64) -> LookupResult<u64> {
        self.record(&self.calls.delete)?;
        Ok(u64::from(self.rows.lock().remove(key).is_some()))
    }

    fn delete_by_value(&self, value: Option<&V>) -> LookupResult<u64> {
        self.record(&self.calls.delete)?;
        let mut rows = self.rows.lock();
        let before = rows.len();
        rows.retain(|_, row| row.as_ref() != value);
        Ok((before - rows.len()) as u64)
    }

    fn is_secondary_key_enabled(&self) -> bool {
        self.secondary_key_enabled
    }
}

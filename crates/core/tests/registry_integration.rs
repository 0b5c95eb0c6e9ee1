//! Integration tests for `EntityLookupCacheContext`.
//!
//! Covers the registry lifecycle, concurrent registration, and shutdown
//! behavior with stores that fail to clear.

use std::sync::{Arc, Barrier};
use std::thread;

use entitylookup_common::{CommonError, LifecycleState};
use entitylookup_core::testing::{InMemoryEntityDao, InMemoryStore, InMemoryStoreProvider};
use entitylookup_core::{
    BackingStore, CacheSlot, EntityLookupCacheContext, LookupError, LookupKey, LookupResult,
    LookupValue, NamespacedKey, PassThroughProvider, SharedCallback, SharedStore, StoreProvider,
};

type Dao = InMemoryEntityDao<String, String>;

fn dao_with(value: &str) -> SharedCallback<u64, String, String> {
    Arc::new(Dao::keyed_by_value().with_row(1, Some(value.to_string())))
}

fn active_context() -> EntityLookupCacheContext<InMemoryStoreProvider> {
    let context = EntityLookupCacheContext::new(InMemoryStoreProvider::new());
    context.on_init().unwrap();
    context
}

/// Store whose `clear` always fails
struct StuckStore<K, V> {
    inner: InMemoryStore<K, V>,
}

impl<K, V> BackingStore<K, V> for StuckStore<K, V>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> LookupResult<Option<V>> {
        self.inner.get(key)
    }

    fn put(&self, key: K, value: V) -> LookupResult<()> {
        self.inner.put(key, value)
    }

    fn remove(&self, key: &K) -> LookupResult<()> {
        self.inner.remove(key)
    }

    fn clear(&self) -> LookupResult<()> {
        Err(CommonError::storage_op("clear", "store is read-only").into())
    }

    fn keys(&self) -> LookupResult<Vec<K>> {
        self.inner.keys()
    }
}

/// Hands out stuck stores for regions starting with "STUCK"
struct StuckProvider;

impl StoreProvider for StuckProvider {
    fn create_store<K, V, VK>(&self, region: &str) -> LookupResult<Option<SharedStore<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        if region.starts_with("STUCK") {
            let store: StuckStore<NamespacedKey<K, VK>, CacheSlot<K, V>> =
                StuckStore { inner: InMemoryStore::new() };
            Ok(Some(Arc::new(store)))
        } else {
            Ok(Some(Arc::new(InMemoryStore::new())))
        }
    }
}

/// Validates that every registry operation fails fast after shutdown.
///
/// # Test Steps
/// 1. Register a cache and shut the registry down
/// 2. Call every operation
/// 3. Verify each fails with `RegistryNotActive { ShutDown }`
#[test]
fn test_registry_rejects_every_call_after_shutdown() {
    let context = active_context();
    context.create_cache("RESOURCE_CACHE", dao_with("alpha")).unwrap();
    context.on_shutdown();

    let is_shut_down = |err: LookupError| {
        matches!(err, LookupError::RegistryNotActive { state: LifecycleState::ShutDown })
    };

    assert!(is_shut_down(context.create_cache("OTHER", dao_with("beta")).unwrap_err()));
    assert!(is_shut_down(
        context.get_cache::<u64, String, String>("RESOURCE_CACHE").unwrap_err()
    ));
    assert!(is_shut_down(context.contains_cache("RESOURCE_CACHE").unwrap_err()));
    assert!(is_shut_down(context.active_caches().unwrap_err()));
    assert!(is_shut_down(context.region_of("RESOURCE_CACHE").unwrap_err()));
    assert!(is_shut_down(context.on_init().unwrap_err()));
}

/// Validates that shutdown clears the stores of registered caches, so
/// handles held elsewhere see an empty cache.
#[test]
fn test_shutdown_clears_registered_caches() {
    let context = active_context();
    let cache = context.create_cache("RESOURCE_CACHE", dao_with("alpha")).unwrap();
    cache.get_by_key(&1).unwrap();
    assert_eq!(cache.get_value(&1).unwrap(), Some("alpha".to_string()));

    context.on_shutdown();

    assert_eq!(context.state(), LifecycleState::ShutDown);
    assert_eq!(cache.get_value(&1).unwrap(), None);
}

/// Validates that a cache failing to clear does not stop shutdown.
#[test]
fn test_shutdown_continues_past_clear_failures() {
    let context = EntityLookupCacheContext::new(StuckProvider);
    context.on_init().unwrap();

    let stuck = context.create_cache("STUCK_CACHE", dao_with("alpha")).unwrap();
    let healthy = context.create_cache("HEALTHY_CACHE", dao_with("beta")).unwrap();
    stuck.get_by_key(&1).unwrap();
    healthy.get_by_key(&1).unwrap();

    context.on_shutdown();

    assert_eq!(context.state(), LifecycleState::ShutDown);
    assert_eq!(stuck.get_value(&1).unwrap(), Some("alpha".to_string()));
    assert_eq!(healthy.get_value(&1).unwrap(), None);
}

/// Validates that re-registering a name replaces the previous cache.
#[test]
fn test_create_cache_twice_replaces_mapping() {
    let context = active_context();
    let first = context.create_cache("RESOURCE_CACHE", dao_with("alpha")).unwrap();
    let second = context.create_cache("RESOURCE_CACHE", dao_with("beta")).unwrap();

    let registered = context.get_cache::<u64, String, String>("RESOURCE_CACHE").unwrap().unwrap();
    assert!(Arc::ptr_eq(&registered, &second));
    assert!(!Arc::ptr_eq(&registered, &first));
    assert_eq!(context.active_caches().unwrap().len(), 1);
    assert_eq!(registered.get_by_key(&1).unwrap(), Some((1, Some("beta".to_string()))));
}

/// Validates that concurrent registration under one name leaves exactly
/// one mapping and readers only observe usable caches.
///
/// # Test Steps
/// 1. Start two writers registering "X" and several readers polling it
/// 2. Readers resolve key 1 on every cache they observe
/// 3. Verify one mapping survives and it is one of the created caches
#[test]
fn test_concurrent_registration_keeps_single_mapping() {
    let context = active_context();
    let barrier = Arc::new(Barrier::new(6));

    let writers: Vec<_> = (0..2)
        .map(|idx| {
            let context = context.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                context.create_cache("X", dao_with(&format!("writer-{idx}"))).unwrap()
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let context = context.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut observed = 0;
                for _ in 0..200 {
                    if let Some(cache) = context.get_cache::<u64, String, String>("X").unwrap() {
                        assert!(cache.is_enabled());
                        assert_eq!(cache.region(), "X_REGION");
                        assert!(cache.get_by_key(&1).unwrap().is_some());
                        observed += 1;
                    }
                }
                observed
            })
        })
        .collect();

    let created: Vec<_> = writers.into_iter().map(|h| h.join().unwrap()).collect();
    for reader in readers {
        reader.join().unwrap();
    }

    let registered = context.get_cache::<u64, String, String>("X").unwrap().unwrap();
    assert!(created.iter().any(|cache| Arc::ptr_eq(cache, &registered)));
    assert_eq!(context.active_caches().unwrap().into_iter().collect::<Vec<_>>(), vec!["X"]);
}

/// Validates the registry over a provider that never creates stores.
#[test]
fn test_pass_through_provider_builds_disabled_caches() {
    let context = EntityLookupCacheContext::new(PassThroughProvider);
    context.on_init().unwrap();

    let dao = Arc::new(Dao::keyed_by_value().with_row(1, Some("alpha".to_string())));
    let cache = context
        .create_cache("RESOURCE_CACHE", Arc::clone(&dao) as SharedCallback<u64, String, String>)
        .unwrap();
    assert!(!cache.is_enabled());

    cache.get_by_key(&1).unwrap();
    cache.get_by_key(&1).unwrap();
    assert_eq!(dao.find_by_key_calls(), 2);
}

/// Validates the names and regions reported by the registry.
#[test]
fn test_active_caches_and_regions_snapshot() {
    let context = active_context();
    context.create_cache("RESOURCE_CACHE", dao_with("alpha")).unwrap();
    context.create_cache("USER_REGION", dao_with("beta")).unwrap();

    let names: Vec<_> = context.active_caches().unwrap().into_iter().collect();
    assert_eq!(names, vec!["RESOURCE_CACHE".to_string(), "USER_REGION".to_string()]);
    assert_eq!(context.region_of("USER_REGION").unwrap().as_deref(), Some("USER_REGION"));
    assert!(context.contains_cache("RESOURCE_CACHE").unwrap());
    assert!(!context.contains_cache("MISSING").unwrap());
}

//! Named cache registry with a guarded lifecycle
//!
//! Domain services share one [`EntityLookupCacheContext`] and look caches up
//! by name:
//!
//! ```rust,ignore
//! let context = EntityLookupCacheContext::new(provider);
//! context.on_init()?;
//!
//! let cache = match context.get_cache::<u64, Resource, String>("RESOURCE_CACHE")? {
//!     Some(cache) => cache,
//!     None => context.create_cache("RESOURCE_CACHE", Arc::new(ResourceDao::new(pool)))?,
//! };
//! ```
//!
//! Every operation other than `on_init` / `on_shutdown` fails with
//! [`LookupError::RegistryNotActive`] outside the `Active` state.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use entitylookup_common::{LifecycleCell, LifecycleState};
use parking_lot::RwLock;

use super::ports::StoreProvider;
use crate::errors::{LookupError, LookupResult};
use crate::lookup::{EntityLookupCache, LookupKey, LookupValue, SharedCallback};

/// Suffix appended to a cache name to form its store region
pub const REGION_SUFFIX: &str = "_REGION";

/// Type-independent view of a registered cache
trait ManagedCache: Send + Sync {
    fn clear(&self) -> LookupResult<()>;
}

impl<K, V, VK> ManagedCache for EntityLookupCache<K, V, VK>
where
    K: LookupKey,
    V: LookupValue,
    VK: LookupKey,
{
    fn clear(&self) -> LookupResult<()> {
        EntityLookupCache::clear(self)
    }
}

struct RegistryEntry {
    region: String,
    cache: Arc<dyn ManagedCache>,
    /// Same allocation as `cache`, kept for downcasting
    handle: Arc<dyn Any + Send + Sync>,
}

impl RegistryEntry {
    fn new<K, V, VK>(region: String, cache: Arc<EntityLookupCache<K, V, VK>>) -> Self
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        let handle: Arc<dyn Any + Send + Sync> = Arc::clone(&cache) as _;
        Self { region, cache, handle }
    }
}

struct ContextInner<P> {
    provider: P,
    caches: RwLock<HashMap<String, RegistryEntry>>,
    state: LifecycleCell,
}

/// Registry of named [`EntityLookupCache`]s
///
/// Cheap to clone; clones share the same registry.
pub struct EntityLookupCacheContext<P> {
    inner: Arc<ContextInner<P>>,
}

impl<P> Clone for EntityLookupCacheContext<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P> fmt::Debug for EntityLookupCacheContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLookupCacheContext")
            .field("state", &self.inner.state.load())
            .field("cache_count", &self.inner.caches.read().len())
            .finish_non_exhaustive()
    }
}

impl<P: StoreProvider> EntityLookupCacheContext<P> {
    /// Create an uninitialized registry using `provider` for cache stores
    pub fn new(provider: P) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                provider,
                caches: RwLock::new(HashMap::new()),
                state: LifecycleCell::default(),
            }),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.inner.state.load()
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    /// Activate the registry.
    ///
    /// Calling this again while active is a no-op. A shut down registry
    /// cannot be reactivated.
    pub fn on_init(&self) -> LookupResult<()> {
        match self.inner.state.transition(LifecycleState::Uninitialized, LifecycleState::Active) {
            Ok(()) => {
                tracing::info!("Entity lookup cache registry initialized");
                Ok(())
            }
            Err(LifecycleState::Active) => Ok(()),
            Err(state) => Err(LookupError::RegistryNotActive { state }),
        }
    }

    /// Clear every registered cache, drop all registrations and shut down.
    ///
    /// Clear failures are logged and skipped. Repeated calls are no-ops.
    pub fn on_shutdown(&self) {
        let mut caches = self.inner.caches.write();
        if self.inner.state.replace(LifecycleState::ShutDown) == LifecycleState::ShutDown {
            return;
        }

        let cache_count = caches.len();
        for (name, entry) in caches.drain() {
            if let Err(err) = entry.cache.clear() {
                tracing::warn!(
                    cache = %name,
                    region = %entry.region,
                    error = %err,
                    "Failed to clear lookup cache during shutdown"
                );
            }
        }

        tracing::info!(cache_count, "Entity lookup cache registry shut down");
    }

    /// Build a cache for `name` and register it, replacing any previous one.
    ///
    /// The cache's store region is `name` with [`REGION_SUFFIX`] appended,
    /// unless `name` already ends with it.
    pub fn create_cache<K, V, VK>(
        &self,
        name: &str,
        callback: SharedCallback<K, V, VK>,
    ) -> LookupResult<Arc<EntityLookupCache<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        self.ensure_active()?;
        if name.is_empty() {
            return Err(LookupError::InvalidArgument("cache name must not be empty".to_string()));
        }

        let region = region_for(name);
        let mut caches = self.inner.caches.write();
        // shutdown may have won the race for the lock
        self.ensure_active()?;

        let store = self.inner.provider.create_store::<K, V, VK>(&region)?;
        let enabled = store.is_some();
        let cache = Arc::new(EntityLookupCache::with_region(store, region.clone(), callback));

        let replaced = caches
            .insert(name.to_string(), RegistryEntry::new(region.clone(), Arc::clone(&cache)))
            .is_some();

        tracing::info!(
            cache = %name,
            region = %region,
            enabled,
            replaced,
            "Lookup cache registered"
        );
        Ok(cache)
    }

    /// Registered cache for `name`, if any.
    ///
    /// Fails with [`LookupError::TypeMismatch`] when the cache was created
    /// with different key or value types.
    pub fn get_cache<K, V, VK>(
        &self,
        name: &str,
    ) -> LookupResult<Option<Arc<EntityLookupCache<K, V, VK>>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        self.ensure_active()?;

        let caches = self.inner.caches.read();
        let Some(entry) = caches.get(name) else {
            tracing::warn!(cache = %name, "Lookup cache is not registered");
            return Ok(None);
        };

        Arc::clone(&entry.handle)
            .downcast::<EntityLookupCache<K, V, VK>>()
            .map(Some)
            .map_err(|_| LookupError::TypeMismatch { name: name.to_string() })
    }

    pub fn contains_cache(&self, name: &str) -> LookupResult<bool> {
        self.ensure_active()?;
        Ok(self.inner.caches.read().contains_key(name))
    }

    /// Snapshot of the registered cache names
    pub fn active_caches(&self) -> LookupResult<BTreeSet<String>> {
        self.ensure_active()?;
        Ok(self.inner.caches.read().keys().cloned().collect())
    }

    /// Store region assigned to the cache registered as `name`
    pub fn region_of(&self, name: &str) -> LookupResult<Option<String>> {
        self.ensure_active()?;
        Ok(self.inner.caches.read().get(name).map(|entry| entry.region.clone()))
    }

    fn ensure_active(&self) -> LookupResult<()> {
        match self.inner.state.load() {
            LifecycleState::Active => Ok(()),
            state => Err(LookupError::RegistryNotActive { state }),
        }
    }
}

fn region_for(name: &str) -> String {
    if name.ends_with(REGION_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{REGION_SUFFIX}")
    }
}

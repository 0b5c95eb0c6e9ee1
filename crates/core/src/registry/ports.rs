//! Port interfaces for the cache registry

use crate::errors::LookupResult;
use crate::lookup::{LookupKey, LookupValue, SharedStore};

/// Creates the backing store for each cache the registry builds
///
/// Returning `None` gives the cache no store, so it passes every call
/// through to its callback.
pub trait StoreProvider: Send + Sync + 'static {
    fn create_store<K, V, VK>(&self, region: &str) -> LookupResult<Option<SharedStore<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey;
}

/// Provider that never creates a store
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughProvider;

impl StoreProvider for PassThroughProvider {
    fn create_store<K, V, VK>(&self, _region: &str) -> LookupResult<Option<SharedStore<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        Ok(None)
    }
}

//! Adaptor for entities that are never updated or deleted

use std::marker::PhantomData;

use super::ports::{EntityLookupCallback, EntityPair};
use crate::errors::{LookupError, LookupResult};

/// Data access for read-only entities
///
/// Only lookup by key is required. Creation is optional.
pub trait ImmutableEntityLookup<K, V>: Send + Sync {
    fn find_by_key(&self, key: &K) -> LookupResult<Option<EntityPair<K, V>>>;

    fn create_value(&self, _value: Option<V>) -> LookupResult<EntityPair<K, V>> {
        Err(LookupError::UnsupportedOperation("create_value"))
    }
}

/// Presents an [`ImmutableEntityLookup`] as a full [`EntityLookupCallback`]
///
/// Values have no secondary key, value lookups find nothing, and every
/// mutation fails with [`LookupError::UnsupportedOperation`].
pub struct ImmutableEntityAdaptor<T, VK = ()> {
    inner: T,
    _value_key: PhantomData<fn() -> VK>,
}

impl<T, VK> ImmutableEntityAdaptor<T, VK> {
    pub fn new(inner: T) -> Self {
        Self { inner, _value_key: PhantomData }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T, K, V, VK> EntityLookupCallback<K, V, VK> for ImmutableEntityAdaptor<T, VK>
where
    T: ImmutableEntityLookup<K, V>,
{
    fn get_value_key(&self, _value: &V) -> Option<VK> {
        None
    }

    fn find_by_key(&self, key: &K) -> LookupResult<Option<EntityPair<K, V>>> {
        self.inner.find_by_key(key)
    }

    fn find_by_value(&self, _value: Option<&V>) -> LookupResult<Option<EntityPair<K, V>>> {
        Ok(None)
    }

    fn create_value(&self, value: Option<V>) -> LookupResult<EntityPair<K, V>> {
        self.inner.create_value(value)
    }

    fn update_value(&self, _key: &K, _value: Option<&V>) -> LookupResult<u64> {
        Err(LookupError::UnsupportedOperation("update_value"))
    }

    fn delete_by_key(&self, _key: &K) -> LookupResult<u64> {
        Err(LookupError::UnsupportedOperation("delete_by_key"))
    }

    fn delete_by_value(&self, _value: Option<&V>) -> LookupResult<u64> {
        Err(LookupError::UnsupportedOperation("delete_by_value"))
    }
}

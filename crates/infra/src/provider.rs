//! Config-driven [`StoreProvider`]

use std::sync::Arc;

use entitylookup_common::CommonResult;
use entitylookup_core::{
    CacheSlot, LookupKey, LookupResult, LookupValue, NamespacedKey, SharedStore, StoreProvider,
};

use crate::config::{self, LookupCacheConfig, StoreBackend};
use crate::stores::{ConcurrentMapStore, MokaStore, MokaStoreConfig};

/// Builds a moka or dashmap store per region from a [`LookupCacheConfig`]
///
/// Disabled regions (or a globally disabled config) get no store, which
/// turns their caches into pass-throughs.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredStoreProvider {
    config: LookupCacheConfig,
}

impl ConfiguredStoreProvider {
    /// # Errors
    /// Returns `CommonError::Config` if the configuration fails validation.
    pub fn new(config: LookupCacheConfig) -> CommonResult<Self> {
        config.validate()?;
        config.log_config();
        Ok(Self { config })
    }

    /// Provider over [`config::load`]
    pub fn from_environment() -> CommonResult<Self> {
        Self::new(config::load()?)
    }

    pub fn config(&self) -> &LookupCacheConfig {
        &self.config
    }
}

impl StoreProvider for ConfiguredStoreProvider {
    fn create_store<K, V, VK>(&self, region: &str) -> LookupResult<Option<SharedStore<K, V, VK>>>
    where
        K: LookupKey,
        V: LookupValue,
        VK: LookupKey,
    {
        let settings = self.config.resolve(region);
        if !settings.enabled {
            tracing::debug!(region = %region, "Caching disabled for region");
            return Ok(None);
        }

        let store: SharedStore<K, V, VK> = match settings.backend {
            StoreBackend::Moka => {
                Arc::new(MokaStore::<NamespacedKey<K, VK>, CacheSlot<K, V>>::new(MokaStoreConfig {
                    max_capacity: settings.max_capacity,
                    time_to_live: settings.ttl,
                }))
            }
            StoreBackend::ConcurrentMap => {
                Arc::new(ConcurrentMapStore::<NamespacedKey<K, VK>, CacheSlot<K, V>>::new())
            }
        };

        tracing::debug!(
            region = %region,
            backend = %settings.backend,
            max_capacity = ?settings.max_capacity,
            ttl_seconds = ?settings.ttl.map(|ttl| ttl.as_secs()),
            "Created backing store"
        );
        Ok(Some(store))
    }
}

#[cfg(test)]
mod tests {
    use entitylookup_common::CommonError;
    use entitylookup_core::BackingStore;

    use super::*;
    use crate::config::RegionSettings;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = LookupCacheConfig { ttl_seconds: Some(0), ..LookupCacheConfig::default() };
        let err = ConfiguredStoreProvider::new(config).unwrap_err();
        assert!(matches!(err, CommonError::Config { .. }));
    }

    #[test]
    fn test_disabled_region_gets_no_store() {
        let mut config = LookupCacheConfig::default();
        let audit = RegionSettings { enabled: Some(false), ..RegionSettings::default() };
        config.regions.insert("AUDIT".to_string(), audit);
        let provider = ConfiguredStoreProvider::new(config).unwrap();

        let disabled = provider.create_store::<u64, String, String>("AUDIT_REGION").unwrap();
        assert!(disabled.is_none());

        let enabled = provider.create_store::<u64, String, String>("USER_REGION").unwrap();
        assert!(enabled.is_some());
    }

    #[test]
    fn test_globally_disabled() {
        let config = LookupCacheConfig { enabled: false, ..LookupCacheConfig::default() };
        let provider = ConfiguredStoreProvider::new(config).unwrap();

        assert!(provider.create_store::<u64, String, String>("USER_REGION").unwrap().is_none());
    }

    #[test]
    fn test_each_region_gets_its_own_store() {
        let provider = ConfiguredStoreProvider::default();
        let a = provider.create_store::<u64, String, String>("A_REGION").unwrap().unwrap();
        let b = provider.create_store::<u64, String, String>("B_REGION").unwrap().unwrap();

        a.put(NamespacedKey::primary("A_REGION", 1), CacheSlot::NotFound).unwrap();
        assert!(b.keys().unwrap().is_empty());
    }
}

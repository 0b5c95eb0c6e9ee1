//! Store configuration for lookup caches
//!
//! [`LookupCacheConfig`] selects the backing store each cache region gets
//! from the [`ConfiguredStoreProvider`](crate::provider::ConfiguredStoreProvider).
//! The [`loader`] reads it from the environment or from a TOML/JSON file.

pub mod loader;
pub mod settings;

pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
pub use settings::{LookupCacheConfig, RegionSettings, ResolvedRegion, StoreBackend};

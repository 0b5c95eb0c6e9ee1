//! # Entity Lookup Infrastructure
//!
//! Infrastructure implementations of the lookup cache ports.
//!
//! This crate contains:
//! - Backing stores on `moka` and `DashMap`
//! - A config-driven [`StoreProvider`](entitylookup_core::StoreProvider)
//! - The configuration loader (environment, TOML, JSON)
//! - Tracing subscriber initialisation
//!
//! ## Architecture
//! - Implements traits defined in `entitylookup-core`
//! - Depends on `entitylookup-common` for errors

pub mod config;
pub mod observability;
pub mod provider;
pub mod stores;

pub use config::{LookupCacheConfig, RegionSettings, StoreBackend};
pub use observability::{init_tracing, LogFormat};
pub use provider::ConfiguredStoreProvider;
pub use stores::{ConcurrentMapStore, MokaStore, MokaStoreConfig};

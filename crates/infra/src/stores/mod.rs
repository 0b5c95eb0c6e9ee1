//! In-process [`BackingStore`](entitylookup_core::BackingStore) adapters
//!
//! - [`MokaStore`]: bounded, optionally expiring store on `moka::sync::Cache`
//! - [`ConcurrentMapStore`]: unbounded sharded map on `DashMap`

pub mod concurrent_map;
pub mod moka_store;

pub use concurrent_map::ConcurrentMapStore;
pub use moka_store::{MokaStore, MokaStoreConfig};

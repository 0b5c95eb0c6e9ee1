//! # Entity Lookup Core
//!
//! Two-way entity lookup caching and the registry that manages named caches.
//!
//! This crate contains:
//! - [`EntityLookupCache`]: read-through cache indexed by key and by value
//! - [`EntityLookupCacheContext`]: named cache registry with a lifecycle
//! - Port interfaces ([`BackingStore`], [`EntityLookupCallback`], [`StoreProvider`])
//! - Test doubles in [`testing`]
//!
//! ## Architecture Principles
//! - Only depends on `entitylookup-common`
//! - No store technology; stores arrive through [`StoreProvider`]
//! - All external dependencies via traits

pub mod errors;
pub mod lookup;
pub mod registry;
pub mod testing;

pub use errors::{LookupError, LookupResult};
pub use lookup::{
    BackingStore, CacheSlot, EntityLookupCache, EntityLookupCallback, EntityPair,
    ImmutableEntityAdaptor, ImmutableEntityLookup, LookupKey, LookupStats, LookupValue,
    NamespacedKey, SharedCallback, SharedStore, ValueKey, DEFAULT_REGION,
};
pub use registry::{EntityLookupCacheContext, PassThroughProvider, StoreProvider, REGION_SUFFIX};

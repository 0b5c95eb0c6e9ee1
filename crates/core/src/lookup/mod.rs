//! Two-way entity lookup caching
//!
//! [`EntityLookupCache`] sits between a domain service and its
//! [`EntityLookupCallback`]. It indexes entities by primary key and by a
//! value-derived key, memoizes "not found" results, and keeps both indices
//! consistent across updates and deletes.

pub mod adaptor;
pub mod cache;
pub mod keys;
pub mod ports;
pub mod slot;
pub mod stats;

use std::fmt::Debug;
use std::hash::Hash;

pub use adaptor::{ImmutableEntityAdaptor, ImmutableEntityLookup};
pub use cache::{EntityLookupCache, SharedCallback, SharedStore};
pub use keys::{NamespacedKey, ValueKey, DEFAULT_REGION};
pub use ports::{BackingStore, EntityLookupCallback, EntityPair};
pub use slot::CacheSlot;
pub use stats::LookupStats;

/// Bounds required of primary and value-derived keys
pub trait LookupKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

impl<T> LookupKey for T where T: Clone + Eq + Hash + Debug + Send + Sync + 'static {}

/// Bounds required of cached values
pub trait LookupValue: Clone + Send + Sync + 'static {}

impl<T> LookupValue for T where T: Clone + Send + Sync + 'static {}

//! Process-wide registry of named lookup caches

pub mod context;
pub mod ports;

pub use context::{EntityLookupCacheContext, REGION_SUFFIX};
pub use ports::{PassThroughProvider, StoreProvider};

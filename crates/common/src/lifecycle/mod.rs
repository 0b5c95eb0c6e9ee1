//! Lifecycle management utilities for registry-style components
//!
//! - **[`state`]**: the `Uninitialized → Active → ShutDown` state machine and
//!   the lock-free [`LifecycleCell`] that holds it

pub mod state;

pub use state::{LifecycleCell, LifecycleState};

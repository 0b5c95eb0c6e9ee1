//! Lifecycle state for components with an explicit init/shutdown protocol
//!
//! The state is kept in an [`AtomicU8`] so the hot path (every registry call
//! checks it) never takes a lock. Components that must make a state check
//! atomic with a mutation re-read the cell while holding their own lock.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Component lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Component has been created but `on_init` has not run
    Uninitialized,
    /// Component is initialized and serving requests
    Active,
    /// Component has been shut down (terminal)
    ShutDown,
}

impl LifecycleState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Active => 1,
            Self::ShutDown => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Active,
            _ => Self::ShutDown,
        }
    }

    /// Whether requests may be served in this state
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Whether no further transition is possible
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ShutDown)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Active => write!(f, "Active"),
            Self::ShutDown => write!(f, "Shut Down"),
        }
    }
}

/// Atomic holder for a [`LifecycleState`]
#[derive(Debug)]
pub struct LifecycleCell {
    raw: AtomicU8,
}

impl LifecycleCell {
    pub const fn new(initial: LifecycleState) -> Self {
        Self { raw: AtomicU8::new(initial.as_u8()) }
    }

    pub fn load(&self) -> LifecycleState {
        LifecycleState::from_u8(self.raw.load(Ordering::Acquire))
    }

    /// Move from `from` to `to` if the cell still holds `from`.
    ///
    /// Returns the observed state on failure.
    pub fn transition(&self, from: LifecycleState, to: LifecycleState) -> Result<(), LifecycleState> {
        self.raw
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(LifecycleState::from_u8)
    }

    /// Unconditionally store `state`, returning the previous one.
    pub fn replace(&self, state: LifecycleState) -> LifecycleState {
        LifecycleState::from_u8(self.raw.swap(state.as_u8(), Ordering::AcqRel))
    }
}

impl Default for LifecycleCell {
    fn default() -> Self {
        Self::new(LifecycleState::Uninitialized)
    }
}

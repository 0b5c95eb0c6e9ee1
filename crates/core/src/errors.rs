//! Error types for the lookup engine and the cache registry

use entitylookup_common::error::{CommonError, ErrorSeverity};
use entitylookup_common::{impl_error_classification, impl_error_conversion, LifecycleState};
use thiserror::Error;

/// Result alias used by every lookup, store and registry operation
pub type LookupResult<T> = Result<T, LookupError>;

/// Failures raised by [`EntityLookupCache`](crate::EntityLookupCache),
/// its collaborators, and [`EntityLookupCacheContext`](crate::EntityLookupCacheContext).
///
/// A cache miss is never an error; lookups return `Option`.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Store, backend and configuration failures
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation attempted through a read-only entity source
    #[error("Operation '{0}' is not supported for immutable entities")]
    UnsupportedOperation(&'static str),

    #[error("Secondary key management is disabled for region '{0}'")]
    SecondaryKeyDisabled(String),

    #[error("Cache registry is not active (state: {state})")]
    RegistryNotActive { state: LifecycleState },

    /// A registered cache was requested with different key or value types
    #[error("Cache '{name}' is registered with different key or value types")]
    TypeMismatch { name: String },
}

impl LookupError {
    /// A store returned a slot whose shape is invalid for the key it was read from.
    pub fn corrupt_slot(region: &str, detail: &str) -> Self {
        Self::Common(CommonError::internal_with_context(
            format!("unexpected cache slot: {detail}"),
            format!("region {region}"),
        ))
    }
}

impl_error_conversion!(LookupError, Common);
impl_error_classification!(LookupError, Common,
    Self::InvalidArgument(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::UnsupportedOperation(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::SecondaryKeyDisabled(_) => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::RegistryNotActive { .. } => {
        retryable: false,
        severity: ErrorSeverity::Warning,
        critical: false,
    },
    Self::TypeMismatch { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
);

impl From<LookupError> for CommonError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Common(inner) => inner,
            LookupError::InvalidArgument(msg) => CommonError::validation("argument", msg),
            LookupError::UnsupportedOperation(op) => {
                CommonError::unsupported_by(op, "immutable entity")
            }
            LookupError::SecondaryKeyDisabled(region) => CommonError::unsupported_by(
                "secondary key lookup",
                format!("region {region}"),
            ),
            LookupError::RegistryNotActive { state } => {
                CommonError::illegal_state("cache registry", format!("registry is {state}"))
            }
            LookupError::TypeMismatch { name } => {
                CommonError::validation_with_value("cache", "registered with different types", name)
            }
        }
    }
}

//! Integration tests for `entitylookup_common::error`.
//!
//! These suites validate classification, logging payloads, and module error
//! delegation through the exported macros so downstream crates receive
//! consistent failure semantics.

use std::time::Duration;

use entitylookup_common::error::{CommonError, CommonResult, ErrorClassification, ErrorSeverity};
use entitylookup_common::{impl_error_classification, impl_error_conversion, LifecycleState};
use thiserror::Error;

#[derive(Debug, Error)]
enum RegistryError {
    #[error(transparent)]
    Common(#[from] CommonError),

    #[error("registry is {state}")]
    NotActive { state: LifecycleState },

    #[error("stale handle: {0}")]
    Stale(String),
}

impl_error_conversion!(RegistryError, Common);
impl_error_classification!(RegistryError, Common,
    Self::NotActive { .. } => {
        retryable: false,
        severity: ErrorSeverity::Error,
        critical: false,
    },
    Self::Stale(_) => {
        retryable: true,
        severity: ErrorSeverity::Warning,
        critical: false,
        retry_after: Some(Duration::from_millis(50)),
    },
);

/// Validates that `CommonError` classification surfaces the expected retryable,
/// severity, and criticality combinations for each variant.
#[test]
fn test_classification_matrix_matches_expected_contract() {
    let cases = vec![
        (CommonError::config("missing backend"), false, ErrorSeverity::Error, false),
        (CommonError::lock("contended"), true, ErrorSeverity::Warning, false),
        (CommonError::serialization("invalid TOML"), false, ErrorSeverity::Error, false),
        (CommonError::persistence("disk full"), false, ErrorSeverity::Error, false),
        (CommonError::storage_op("put", "evicted"), false, ErrorSeverity::Error, false),
        (CommonError::backend("dao", "timeout", true), true, ErrorSeverity::Warning, false),
        (CommonError::validation("name", "empty"), false, ErrorSeverity::Error, false),
        (CommonError::not_found("cache"), false, ErrorSeverity::Info, false),
        (CommonError::unsupported("update"), false, ErrorSeverity::Error, false),
        (CommonError::illegal_state("registry", "shut down"), false, ErrorSeverity::Error, false),
        (CommonError::internal("corrupt slot"), false, ErrorSeverity::Critical, true),
    ];

    for (err, retryable, severity, critical) in cases {
        assert_eq!(err.is_retryable(), retryable, "retryable mismatch for {err}");
        assert_eq!(err.severity(), severity, "severity mismatch for {err}");
        assert_eq!(err.is_critical(), critical, "critical mismatch for {err}");
    }
}

/// Validates that module errors built with the macros delegate to
/// `CommonError` for the `Common` variant and use their own rules otherwise.
///
/// # Test Steps
/// 1. Wrap a retryable lock error and check delegation
/// 2. Check the module-specific variants
/// 3. Check `retry_after` falls back to `None` where not declared
#[test]
fn test_module_error_delegates_classification() {
    let wrapped: RegistryError = CommonError::lock("registry").into();
    assert!(wrapped.is_retryable());
    assert_eq!(wrapped.severity(), ErrorSeverity::Warning);
    assert_eq!(wrapped.retry_after(), Some(Duration::from_millis(10)));

    let inactive = RegistryError::NotActive { state: LifecycleState::ShutDown };
    assert!(!inactive.is_retryable());
    assert_eq!(inactive.retry_after(), None);
    assert_eq!(inactive.to_string(), "registry is Shut Down");

    let stale = RegistryError::Stale("orders".into());
    assert!(stale.is_retryable());
    assert_eq!(stale.retry_after(), Some(Duration::from_millis(50)));
}

/// Validates the std conversions generated by `impl_error_conversion!`.
#[test]
fn test_module_error_converts_std_errors() {
    fn parse(raw: &str) -> Result<serde_json::Value, RegistryError> {
        Ok(serde_json::from_str(raw)?)
    }

    let err = parse("{ broken").unwrap_err();
    assert!(matches!(err, RegistryError::Common(CommonError::Serialization { .. })));

    let io: RegistryError = std::io::Error::other("read failed").into();
    assert!(matches!(io, RegistryError::Common(CommonError::Persistence { .. })));
}

/// Validates `as_tracing_fields` yields stable keys for every variant.
#[test]
fn test_tracing_fields_always_lead_with_error_type() {
    let errors = [
        CommonError::config_field("backend", "unknown"),
        CommonError::backend("dao", "down", false),
        CommonError::not_found_with_id("cache", "orders"),
        CommonError::unsupported_by("delete_by_key", "immutable entity"),
        CommonError::internal_with_context("bad slot", "lookup"),
    ];

    for err in errors {
        let fields = err.as_tracing_fields();
        assert_eq!(fields[0].0, "error_type");
        assert_eq!(fields[0].1, err.error_type_name());
        assert!(fields.len() >= 2);
    }
}

/// Validates `CommonResult` composes with `?`.
#[test]
fn test_common_result_propagates() {
    fn load(raw: &str) -> CommonResult<u64> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        value.as_u64().ok_or_else(|| CommonError::validation_with_value("value", "not a u64", raw))
    }

    assert_eq!(load("42").unwrap(), 42);
    match load("\"x\"") {
        Err(CommonError::Validation { value, .. }) => assert_eq!(value.as_deref(), Some("\"x\"")),
        other => panic!("unexpected result: {other:?}"),
    }
}

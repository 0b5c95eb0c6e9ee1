//! Global subscriber installation.
//!
//! Kept in its own test binary because it installs the process-wide
//! subscriber.

use entitylookup_common::CommonError;
use entitylookup_infra::{init_tracing, LogFormat};

#[test]
fn test_second_init_is_rejected() {
    init_tracing(LogFormat::Json).expect("first subscriber should install");

    let err = init_tracing(LogFormat::Pretty).unwrap_err();
    assert!(matches!(err, CommonError::IllegalState { .. }), "unexpected error: {:?}", err);

    tracing::info!(region = "USER_REGION", "event after init");
}

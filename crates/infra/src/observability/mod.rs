//! Tracing subscriber initialisation
//!
//! Library code only emits `tracing` events. Binaries and test harnesses
//! call [`init_tracing`] once to install a subscriber.
//!
//! The filter is read from `ENTITYLOOKUP_LOG`, then `RUST_LOG`, and falls
//! back to [`DEFAULT_LOG_FILTER`].

use std::fmt;
use std::str::FromStr;

use entitylookup_common::{CommonError, CommonResult};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

pub const LOG_ENV_VAR: &str = "ENTITYLOOKUP_LOG";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Output format of the installed subscriber
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human readable, multi-line
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(CommonError::config_field(
                "log_format",
                format!("Unknown log format '{}' (expected pretty or json)", other),
            )),
        }
    }
}

/// Install the global tracing subscriber
///
/// # Errors
/// Returns `CommonError::IllegalState` if a global subscriber is already
/// installed.
pub fn init_tracing(format: LogFormat) -> CommonResult<()> {
    let filter = env_filter();

    let installed = match format {
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .try_init(),
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_names(true)
                    .with_current_span(true),
            )
            .try_init(),
    };

    installed.map_err(|e| {
        CommonError::illegal_state(
            "tracing",
            format!("Failed to install tracing subscriber: {}", e),
        )
    })?;

    tracing::info!(format = %format, "Tracing initialized");
    Ok(())
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

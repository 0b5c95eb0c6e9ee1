//! Lookup cache configuration types

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use entitylookup_common::{CommonError, CommonResult};
use entitylookup_core::REGION_SUFFIX;
use serde::{Deserialize, Serialize};

/// Store implementation backing a cache region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Bounded `moka` cache with optional TTL
    #[default]
    Moka,
    /// Unbounded `DashMap`
    ConcurrentMap,
}

impl StoreBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moka => "moka",
            Self::ConcurrentMap => "concurrent_map",
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreBackend {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "moka" => Ok(Self::Moka),
            "concurrent_map" | "dashmap" => Ok(Self::ConcurrentMap),
            other => Err(CommonError::config_field(
                "backend",
                format!("Unknown store backend '{}' (expected moka or concurrent_map)", other),
            )),
        }
    }
}

/// Per-region overrides; unset fields inherit the top-level value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionSettings {
    pub enabled: Option<bool>,
    pub backend: Option<StoreBackend>,
    pub max_capacity: Option<u64>,
    pub ttl_seconds: Option<u64>,
}

/// Top-level lookup cache configuration
///
/// ```toml
/// enabled = true
/// backend = "moka"
/// max_capacity = 10000
/// ttl_seconds = 300
///
/// [regions.CURRENCY]
/// backend = "concurrent_map"
///
/// [regions.AUDIT_LOG]
/// enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupCacheConfig {
    /// When false every cache passes straight through to its callback
    pub enabled: bool,
    pub backend: StoreBackend,
    pub max_capacity: Option<u64>,
    pub ttl_seconds: Option<u64>,
    /// Overrides keyed by cache name or by full region name
    pub regions: BTreeMap<String, RegionSettings>,
}

impl Default for LookupCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: StoreBackend::Moka,
            max_capacity: None,
            ttl_seconds: None,
            regions: BTreeMap::new(),
        }
    }
}

/// Effective settings for one region after applying overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRegion {
    pub enabled: bool,
    pub backend: StoreBackend,
    pub max_capacity: Option<u64>,
    pub ttl: Option<Duration>,
}

impl LookupCacheConfig {
    /// Reject zero capacities and zero TTLs
    ///
    /// # Errors
    /// Returns `CommonError::Config` naming the offending field.
    pub fn validate(&self) -> CommonResult<()> {
        check_positive("max_capacity", self.max_capacity)?;
        check_positive("ttl_seconds", self.ttl_seconds)?;

        for (name, region) in &self.regions {
            if name.trim().is_empty() {
                return Err(CommonError::config_field("regions", "Region name must not be empty"));
            }
            check_positive(&format!("regions.{}.max_capacity", name), region.max_capacity)?;
            check_positive(&format!("regions.{}.ttl_seconds", name), region.ttl_seconds)?;
        }

        Ok(())
    }

    /// Override entry for `region`, matched exactly or by cache name
    pub fn region(&self, region: &str) -> Option<&RegionSettings> {
        self.regions.get(region).or_else(|| {
            region.strip_suffix(REGION_SUFFIX).and_then(|name| self.regions.get(name))
        })
    }

    pub fn resolve(&self, region: &str) -> ResolvedRegion {
        let overrides = self.region(region).cloned().unwrap_or_default();

        ResolvedRegion {
            enabled: self.enabled && overrides.enabled.unwrap_or(true),
            backend: overrides.backend.unwrap_or(self.backend),
            max_capacity: overrides.max_capacity.or(self.max_capacity),
            ttl: overrides.ttl_seconds.or(self.ttl_seconds).map(Duration::from_secs),
        }
    }

    /// Log configuration at startup
    pub fn log_config(&self) {
        tracing::info!(
            enabled = self.enabled,
            backend = %self.backend,
            max_capacity = ?self.max_capacity,
            ttl_seconds = ?self.ttl_seconds,
            region_overrides = self.regions.len(),
            "Lookup cache configuration loaded"
        );
    }
}

fn check_positive(field: &str, value: Option<u64>) -> CommonResult<()> {
    match value {
        Some(0) => Err(CommonError::config_field(field, "Value must be greater than zero")),
        _ => Ok(()),
    }
}

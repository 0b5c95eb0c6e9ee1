//! Configuration loader
//!
//! Loads lookup cache configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `ENTITYLOOKUP_CACHE_BACKEND`: `moka` or `concurrent_map` (required)
//! - `ENTITYLOOKUP_CACHE_ENABLED`: Whether caching is enabled (true/false)
//! - `ENTITYLOOKUP_CACHE_MAX_CAPACITY`: Maximum entries per store
//! - `ENTITYLOOKUP_CACHE_TTL_SECONDS`: Entry time-to-live in seconds
//!
//! Region overrides are only available from files.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./entitylookup.{toml,json}` or `./config.{toml,json}` (current working directory)
//! 2. `../` and `../../` of the working directory
//! 3. Relative to executable location

use std::path::{Path, PathBuf};

use entitylookup_common::{CommonError, CommonResult};

use super::settings::{LookupCacheConfig, StoreBackend};

pub const ENV_ENABLED: &str = "ENTITYLOOKUP_CACHE_ENABLED";
pub const ENV_BACKEND: &str = "ENTITYLOOKUP_CACHE_BACKEND";
pub const ENV_MAX_CAPACITY: &str = "ENTITYLOOKUP_CACHE_MAX_CAPACITY";
pub const ENV_TTL_SECONDS: &str = "ENTITYLOOKUP_CACHE_TTL_SECONDS";

const CONFIG_FILE_NAMES: [&str; 4] =
    ["entitylookup.toml", "entitylookup.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// backend variable is missing or invalid, falls back to a config file.
///
/// # Errors
/// Returns `CommonError::Config` if configuration cannot be loaded from
/// either source, or if the file is invalid.
pub fn load() -> CommonResult<LookupCacheConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Lookup cache configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `CommonError::Config` if `ENTITYLOOKUP_CACHE_BACKEND` is missing
/// or any variable has an invalid value.
pub fn load_from_env() -> CommonResult<LookupCacheConfig> {
    let backend: StoreBackend = env_var(ENV_BACKEND)?.parse()?;
    let enabled = env_bool(ENV_ENABLED, true);
    let max_capacity = env_u64(ENV_MAX_CAPACITY)?;
    let ttl_seconds = env_u64(ENV_TTL_SECONDS)?;

    let config = LookupCacheConfig {
        enabled,
        backend,
        max_capacity,
        ttl_seconds,
        ..LookupCacheConfig::default()
    };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// The format is detected by file extension.
///
/// # Errors
/// Returns `CommonError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> CommonResult<LookupCacheConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CommonError::config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CommonError::config("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading lookup cache configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CommonError::config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> CommonResult<LookupCacheConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CommonError::config(format!("Invalid JSON format: {}", e))),
        _ => Err(CommonError::config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the working directory, up to two of its parents, then the same
/// three levels relative to the executable.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut bases = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        bases.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            bases.extend([exe_dir.to_path_buf(), exe_dir.join(".."), exe_dir.join("../..")]);
        }
    }

    bases
        .iter()
        .flat_map(|base| CONFIG_FILE_NAMES.iter().map(move |name| base.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> CommonResult<String> {
    std::env::var(key).map_err(|_| {
        CommonError::config_field(key, format!("Missing required environment variable: {}", key))
    })
}

/// Parse optional unsigned integer from environment variable
fn env_u64(key: &str) -> CommonResult<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| CommonError::config_field(key, format!("Invalid number: {}", e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_cache_env() {
        for key in [ENV_ENABLED, ENV_BACKEND, ENV_MAX_CAPACITY, ENV_TTL_SECONDS] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        for (key, value) in [
            ("ELC_TEST_BOOL_1", "1"),
            ("ELC_TEST_BOOL_TRUE", "true"),
            ("ELC_TEST_BOOL_YES", "yes"),
            ("ELC_TEST_BOOL_ON", "on"),
            ("ELC_TEST_BOOL_UPPER", "TRUE"),
        ] {
            std::env::set_var(key, value);
            assert!(env_bool(key, false), "{} should parse as true", value);
            std::env::remove_var(key);
        }

        for (key, value) in [
            ("ELC_TEST_BOOL_0", "0"),
            ("ELC_TEST_BOOL_FALSE", "false"),
            ("ELC_TEST_BOOL_NO", "no"),
            ("ELC_TEST_BOOL_OFF", "off"),
        ] {
            std::env::set_var(key, value);
            assert!(!env_bool(key, true), "{} should parse as false", value);
            std::env::remove_var(key);
        }

        std::env::remove_var("ELC_TEST_BOOL_MISSING");
        assert!(env_bool("ELC_TEST_BOOL_MISSING", true));
        assert!(!env_bool("ELC_TEST_BOOL_MISSING", false));
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var(ENV_BACKEND, "concurrent_map");
        std::env::set_var(ENV_ENABLED, "false");
        std::env::set_var(ENV_MAX_CAPACITY, "500");
        std::env::set_var(ENV_TTL_SECONDS, "30");

        let result = load_from_env();
        clear_cache_env();

        let config = result.expect("config should load from env vars");
        assert_eq!(config.backend, StoreBackend::ConcurrentMap);
        assert!(!config.enabled);
        assert_eq!(config.max_capacity, Some(500));
        assert_eq!(config.ttl_seconds, Some(30));
        assert!(config.regions.is_empty());
    }

    #[test]
    fn test_load_from_env_missing_backend() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_cache_env();

        let err = load_from_env().unwrap_err();
        assert!(
            matches!(err, CommonError::Config { field: Some(ref f), .. } if f == ENV_BACKEND),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var(ENV_BACKEND, "moka");
        std::env::set_var(ENV_MAX_CAPACITY, "lots");

        let result = load_from_env();
        clear_cache_env();

        let err = result.unwrap_err();
        assert!(matches!(err, CommonError::Config { .. }), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_zero_ttl_rejected() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var(ENV_BACKEND, "moka");
        std::env::set_var(ENV_TTL_SECONDS, "0");

        let result = load_from_env();
        clear_cache_env();

        assert!(matches!(result, Err(CommonError::Config { .. })));
    }

    #[test]
    fn test_parse_config_toml_with_regions() {
        let toml_content = r#"
            backend = "moka"
            max_capacity = 1000
            ttl_seconds = 120

            [regions.CURRENCY]
            backend = "concurrent_map"

            [regions.AUDIT]
            enabled = false
        "#;

        let config = parse_config(toml_content, Path::new("entitylookup.toml")).unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_capacity, Some(1000));
        assert_eq!(config.regions.len(), 2);
        assert_eq!(config.resolve("CURRENCY_REGION").backend, StoreBackend::ConcurrentMap);
        assert!(!config.resolve("AUDIT_REGION").enabled);
    }

    #[test]
    fn test_parse_config_unsupported_extension() {
        let err = parse_config("enabled: true", Path::new("config.yaml")).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "enabled": true,
            "backend": "concurrent_map",
            "regions": { "USER": { "max_capacity": 50, "backend": "moka" } }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let json_path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &json_path).unwrap();

        let result = load_from_file(Some(json_path.clone()));
        std::fs::remove_file(&json_path).ok();

        let config = result.expect("JSON config should load");
        assert_eq!(config.backend, StoreBackend::ConcurrentMap);
        let user = config.resolve("USER_REGION");
        assert_eq!(user.backend, StoreBackend::Moka);
        assert_eq!(user.max_capacity, Some(50));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"backend = [not valid").unwrap();
        temp_file.flush().unwrap();

        let toml_path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &toml_path).unwrap();

        let result = load_from_file(Some(toml_path.clone()));
        std::fs::remove_file(&toml_path).ok();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid TOML format"));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let err = load_from_file(Some(PathBuf::from("/nonexistent/entitylookup.toml")))
            .unwrap_err();
        assert!(matches!(err, CommonError::Config { .. }));
    }
}

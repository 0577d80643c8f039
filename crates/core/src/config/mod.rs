//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MEAL_SW_*)
//! 2. TOML config file (if MEAL_SW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::names::{self, CacheNames};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MEAL_SW_*)
/// 2. TOML config file (if MEAL_SW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite partition store.
    ///
    /// Set via MEAL_SW_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the layer fronts; relative paths and the static manifest
    /// resolve against it.
    ///
    /// Set via MEAL_SW_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Prefix shared by every partition name.
    ///
    /// Set via MEAL_SW_CACHE_PREFIX environment variable.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Live version tag embedded in every partition name.
    ///
    /// Set via MEAL_SW_VERSION environment variable.
    #[serde(default = "default_version")]
    pub version: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via MEAL_SW_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to read per response.
    ///
    /// Set via MEAL_SW_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via MEAL_SW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Seconds between eviction sweeps.
    ///
    /// Set via MEAL_SW_SWEEP_INTERVAL_SECS environment variable.
    #[serde(default = "default_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Seconds between self-update checks.
    ///
    /// Set via MEAL_SW_UPDATE_INTERVAL_SECS environment variable.
    #[serde(default = "default_interval_secs")]
    pub update_interval_secs: u64,

    /// Entry count above which a partition is trimmed.
    ///
    /// Set via MEAL_SW_MAX_ENTRIES environment variable.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Number of oldest entries removed from an oversized partition.
    ///
    /// Set via MEAL_SW_EVICT_COUNT environment variable.
    #[serde(default = "default_evict_count")]
    pub evict_count: usize,

    /// Path served from cache when a navigation fails offline.
    ///
    /// Set via MEAL_SW_OFFLINE_DOCUMENT environment variable.
    #[serde(default = "default_offline_document")]
    pub offline_document: String,

    /// Path of the layer's own definition, polled for updates.
    ///
    /// Set via MEAL_SW_SCRIPT_PATH environment variable.
    #[serde(default = "default_script_path")]
    pub script_path: String,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./meal-sw-cache.sqlite")
}

fn default_origin() -> String {
    "http://127.0.0.1:8000".into()
}

fn default_cache_prefix() -> String {
    names::DEFAULT_PREFIX.into()
}

fn default_version() -> String {
    names::DEFAULT_VERSION.into()
}

fn default_user_agent() -> String {
    "meal-sw/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_interval_secs() -> u64 {
    60
}

fn default_max_entries() -> usize {
    100
}

fn default_evict_count() -> usize {
    50
}

fn default_offline_document() -> String {
    "/index.html".into()
}

fn default_script_path() -> String {
    "/sw.js".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            cache_prefix: default_cache_prefix(),
            version: default_version(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            sweep_interval_secs: default_interval_secs(),
            update_interval_secs: default_interval_secs(),
            max_entries: default_max_entries(),
            evict_count: default_evict_count(),
            offline_document: default_offline_document(),
            script_path: default_script_path(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Partition names for the configured prefix and version.
    pub fn cache_names(&self) -> CacheNames {
        CacheNames::new(&self.cache_prefix, &self.version)
    }

    /// Parsed origin URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `origin` is not an absolute http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;

        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Ok(url),
            _ => Err(ConfigError::Invalid { field: "origin".into(), reason: "must be an http(s) URL with a host".into() }),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MEAL_SW_`
    /// 2. TOML file from `MEAL_SW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MEAL_SW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MEAL_SW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.db_path, PathBuf::from("./meal-sw-cache.sqlite"));
        assert_eq!(config.user_agent, "meal-sw/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.sweep_interval_secs, 60);
        assert_eq!(config.update_interval_secs, 60);
        assert_eq!(config.max_entries, 100);
        assert_eq!(config.evict_count, 50);
        assert_eq!(config.offline_document, "/index.html");
        assert_eq!(config.script_path, "/sw.js");
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.sweep_interval(), Duration::from_secs(60));
        assert_eq!(config.update_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_cache_names_from_config() {
        let config = AppConfig { version: "v9".into(), ..Default::default() };
        let names = config.cache_names();
        assert_eq!(names.static_assets(), "erica-meal-static-v9");
        assert_eq!(names.version(), "v9");
    }

    #[test]
    fn test_origin_url() {
        let config = AppConfig::default();
        assert_eq!(config.origin_url().unwrap().as_str(), "http://127.0.0.1:8000/");

        let config = AppConfig { origin: "ftp://example.com".into(), ..Default::default() };
        assert!(matches!(config.origin_url(), Err(ConfigError::Invalid { .. })));
    }
}

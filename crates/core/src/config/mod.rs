//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (OFFGRID_*)
//! 2. TOML config file (if OFFGRID_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::classify::{DEFAULT_REALTIME_DOMAINS, DEFAULT_STATIC_EXTENSIONS};
use crate::request::Generation;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (OFFGRID_*)
/// 2. TOML config file (if OFFGRID_CONFIG_FILE set)
/// 3. Built-in defaults
///
/// List-valued fields accept figment's array syntax in the environment,
/// e.g. `OFFGRID_SHELL_ASSETS='["./", "./index.html"]'`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name, used as the notification title.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Prefix of the generated cache generation identifier.
    #[serde(default = "default_cache_prefix")]
    pub cache_prefix: String,

    /// Deploy version; bumping it starts a new cache generation.
    ///
    /// Set via OFFGRID_CACHE_VERSION environment variable.
    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    /// Explicit generation identifier, overriding `{cache_prefix}-{cache_version}`.
    #[serde(default)]
    pub generation: Option<String>,

    /// Absolute base URL of the application; relative locators resolve against it.
    ///
    /// Set via OFFGRID_SCOPE environment variable.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Same-origin assets that must all be cached for install to succeed.
    #[serde(default = "default_shell_assets")]
    pub shell_assets: Vec<String>,

    /// Cross-origin static libraries, cached best-effort at install.
    #[serde(default)]
    pub external_assets: Vec<String>,

    /// Cross-origin realtime SDK locators, always served from the network.
    #[serde(default)]
    pub realtime_assets: Vec<String>,

    /// Hosts (and their subdomains) that are always served network-only.
    #[serde(default = "default_realtime_domains")]
    pub realtime_domains: Vec<String>,

    /// File extensions served cache-first, without the leading dot.
    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    /// Cached document served when network-first has nothing better.
    #[serde(default = "default_offline_document")]
    pub offline_document: Option<String>,

    /// Status of the synthesized offline page.
    #[serde(default = "default_offline_status")]
    pub offline_status: u16,

    /// Notification body used when a push carries no payload.
    #[serde(default = "default_notification_body")]
    pub notification_body: String,

    /// Icon and badge locator for notifications.
    #[serde(default)]
    pub notification_icon: Option<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via OFFGRID_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_app_name() -> String {
    "offgrid".into()
}

fn default_cache_prefix() -> String {
    "offgrid".into()
}

fn default_cache_version() -> String {
    "v1".into()
}

fn default_scope() -> String {
    "http://localhost:8080/".into()
}

fn default_shell_assets() -> Vec<String> {
    vec!["./".into(), "./index.html".into(), "./manifest.json".into()]
}

fn default_realtime_domains() -> Vec<String> {
    DEFAULT_REALTIME_DOMAINS.iter().map(|d| d.to_string()).collect()
}

fn default_static_extensions() -> Vec<String> {
    DEFAULT_STATIC_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_offline_document() -> Option<String> {
    Some("./".into())
}

fn default_offline_status() -> u16 {
    503
}

fn default_notification_body() -> String {
    "New update available".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offgrid-cache.sqlite")
}

fn default_user_agent() -> String {
    "offgrid/0.1".into()
}

fn default_max_bytes() -> usize {
    10_485_760 // 10MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            cache_prefix: default_cache_prefix(),
            cache_version: default_cache_version(),
            generation: None,
            scope: default_scope(),
            shell_assets: default_shell_assets(),
            external_assets: Vec::new(),
            realtime_assets: Vec::new(),
            realtime_domains: default_realtime_domains(),
            static_extensions: default_static_extensions(),
            offline_document: default_offline_document(),
            offline_status: default_offline_status(),
            notification_body: default_notification_body(),
            notification_icon: None,
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The generation this deploy installs.
    pub fn generation_id(&self) -> Generation {
        match &self.generation {
            Some(id) => Generation::new(id.trim()),
            None => Generation::new(format!("{}-{}", self.cache_prefix, self.cache_version)),
        }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `OFFGRID_`
    /// 2. TOML file from `OFFGRID_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("OFFGRID_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFGRID_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

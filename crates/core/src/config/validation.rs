//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use crate::locator;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - the generation identifier would be empty
    /// - `scope` is not an absolute http(s) URL
    /// - a static extension is empty or starts with a dot
    /// - `offline_status` is outside 200..=599
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` if no shell assets are configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generation_id().as_str().is_empty() {
            return Err(invalid("generation", "must not be empty"));
        }
        if self.generation.is_none() && (self.cache_prefix.is_empty() || self.cache_version.is_empty()) {
            return Err(invalid("cache_version", "cache_prefix and cache_version must not be empty"));
        }

        locator::parse_scope(&self.scope).map_err(|e| invalid("scope", e.to_string()))?;

        if self.shell_assets.is_empty() {
            return Err(ConfigError::Missing {
                field: "shell_assets".into(),
                hint: "list at least the application's root document, e.g. [\"./\"]".into(),
            });
        }

        if let Some(ext) = self
            .static_extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(invalid("static_extensions", format!("'{ext}' must be non-empty without a leading dot")));
        }

        if !(200..=599).contains(&self.offline_status) {
            return Err(invalid("offline_status", "must be an HTTP status between 200 and 599"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 50 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 50MB"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.offline_document.is_none() {
            tracing::debug!("no offline document configured; network-first falls back to the inline offline page");
        }

        Ok(())
    }
}

//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
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

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `store_dir` or `user_agent` is empty
    /// - `api_base_url` is not an http(s) URL
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `link_timeout_secs` is 0 or exceeds 10 minutes
    /// - `link_max_retries` exceeds 10
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid { field: "store_dir".into(), reason: "must not be empty".into() });
        }

        if !(self.api_base_url.starts_with("https://") || self.api_base_url.starts_with("http://")) {
            return Err(ConfigError::Invalid {
                field: "api_base_url".into(),
                reason: "must be an http or https URL".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.link_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "link_timeout_secs".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.link_timeout_secs > 600 {
            return Err(ConfigError::Invalid {
                field: "link_timeout_secs".into(),
                reason: "must not exceed 10 minutes (600s)".into(),
            });
        }

        // Each retry doubles the timeout, so the budget grows fast.
        if self.link_max_retries > 10 {
            return Err(ConfigError::Invalid { field: "link_max_retries".into(), reason: "must not exceed 10".into() });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.access_token.as_deref().is_some_and(str::is_empty) {
            tracing::warn!("access_token is set but empty; remote requests will be rejected");
        }

        Ok(())
    }
}

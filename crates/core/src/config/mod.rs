//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOCSTASH_*)
//! 2. TOML config file (if DOCSTASH_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOCSTASH_*)
/// 2. TOML config file (if DOCSTASH_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the blob store. A leading `~` is the home directory.
    ///
    /// Set via DOCSTASH_STORE_DIR environment variable.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,

    /// Base URL of the files API.
    ///
    /// Set via DOCSTASH_API_BASE_URL environment variable.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// OAuth2 bearer token for the files API.
    ///
    /// Set via DOCSTASH_ACCESS_TOKEN environment variable.
    /// Required only once a network call is made.
    #[serde(default)]
    pub access_token: Option<String>,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via DOCSTASH_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Timeout for metadata and export requests, in milliseconds.
    ///
    /// Set via DOCSTASH_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// First-attempt timeout for export link downloads, in seconds.
    ///
    /// Set via DOCSTASH_LINK_TIMEOUT_SECS environment variable.
    #[serde(default = "default_link_timeout_secs")]
    pub link_timeout_secs: u64,

    /// How many times a timed-out export link download is retried.
    ///
    /// Set via DOCSTASH_LINK_MAX_RETRIES environment variable.
    #[serde(default = "default_link_max_retries")]
    pub link_max_retries: u32,
}

fn default_store_dir() -> PathBuf {
    PathBuf::from("~/.docstash/blob_store")
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/drive/v3".into()
}

fn default_user_agent() -> String {
    "docstash/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_link_timeout_secs() -> u64 {
    30
}

fn default_link_max_retries() -> u32 {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            api_base_url: default_api_base_url(),
            access_token: None,
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            link_timeout_secs: default_link_timeout_secs(),
            link_max_retries: default_link_max_retries(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for metadata and export requests.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// First-attempt timeout for export link downloads.
    pub fn link_timeout(&self) -> Duration {
        Duration::from_secs(self.link_timeout_secs)
    }

    /// Store directory with the home shorthand expanded.
    pub fn resolved_store_dir(&self) -> PathBuf {
        expand_home(&self.store_dir)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOCSTASH_`
    /// 2. TOML file from `DOCSTASH_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("DOCSTASH_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("DOCSTASH_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Check if an access token is available (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the access token is not set.
    pub fn require_access_token(&self) -> Result<&str, ConfigError> {
        self.access_token.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "access_token".into(),
            hint: "Set DOCSTASH_ACCESS_TOKEN environment variable".into(),
        })
    }
}

/// Expand a leading `~` path component to the user's home directory.
///
/// The home directory comes from `$HOME`, falling back to the account
/// database. Paths without the shorthand, and any path when no home
/// directory is known, come back unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match home_dir() {
        Some(home) if rest.as_os_str().is_empty() => home,
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().filter(|h| !h.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store_dir, PathBuf::from("~/.docstash/blob_store"));
        assert_eq!(config.api_base_url, "https://www.googleapis.com/drive/v3");
        assert_eq!(config.user_agent, "docstash/0.1");
        assert_eq!(config.timeout_ms, 20_000);
        assert_eq!(config.link_timeout_secs, 30);
        assert_eq!(config.link_max_retries, 3);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.link_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_require_access_token_missing() {
        let config = AppConfig::default();
        let result = config.require_access_token();
        assert!(matches!(result, Err(ConfigError::Missing { .. })));
    }

    #[test]
    fn test_require_access_token_present() {
        let config = AppConfig { access_token: Some("ya29.token".into()), ..Default::default() };
        assert_eq!(config.require_access_token().unwrap(), "ya29.token");
    }

    #[test]
    fn test_expand_home_leaves_plain_paths() {
        assert_eq!(expand_home(Path::new("/var/cache/docstash")), PathBuf::from("/var/cache/docstash"));
        assert_eq!(expand_home(Path::new("relative/dir")), PathBuf::from("relative/dir"));
        assert_eq!(expand_home(Path::new("~user/dir")), PathBuf::from("~user/dir"));
    }

    #[test]
    fn test_expand_home_shorthand() {
        let Some(home) = home_dir() else {
            return;
        };
        assert_eq!(expand_home(Path::new("~")), home);
        assert_eq!(expand_home(Path::new("~/.docstash/blob_store")), home.join(".docstash/blob_store"));
    }

    #[test]
    fn test_default_store_dir_is_absolute_without_home_var() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("HOME", "");
            let resolved = AppConfig::default().resolved_store_dir();
            assert!(resolved.is_absolute(), "store dir left relative: {}", resolved.display());
            assert!(resolved.ends_with(".docstash/blob_store"));
            Ok(())
        });
    }

    #[test]
    fn test_load_layers_file_and_env() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "docstash.toml",
                r#"
                store_dir = "/srv/docstash"
                timeout_ms = 5000
                "#,
            )?;
            jail.set_env("DOCSTASH_CONFIG_FILE", "docstash.toml");
            jail.set_env("DOCSTASH_TIMEOUT_MS", "7000");
            jail.set_env("DOCSTASH_ACCESS_TOKEN", "secret");

            let config = AppConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.store_dir, PathBuf::from("/srv/docstash"));
            assert_eq!(config.timeout_ms, 7000);
            assert_eq!(config.access_token.as_deref(), Some("secret"));
            assert_eq!(config.link_max_retries, 3);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("DOCSTASH_LINK_TIMEOUT_SECS", "0");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "link_timeout_secs"));
            Ok(())
        });
    }
}

//! Layered configuration.
//!
//! Sources, highest precedence first:
//!
//! 1. Environment variables (`NUTRISCAN_*`)
//! 2. TOML config file (`--config`, or `NUTRISCAN_CONFIG_FILE`)
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

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "NUTRISCAN_";

/// Environment variable naming a TOML config file.
pub const CONFIG_FILE_ENV: &str = "NUTRISCAN_CONFIG_FILE";

/// Lookup configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutriConfig {
    /// Base URL of the Open Food Facts instance.
    ///
    /// Set via `NUTRISCAN_BASE_URL`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User-Agent sent with every request.
    ///
    /// Set via `NUTRISCAN_USER_AGENT`.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds.
    ///
    /// Set via `NUTRISCAN_TIMEOUT_MS`.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// How long complete records stay cached, in seconds.
    ///
    /// Set via `NUTRISCAN_CACHE_TTL_SECS`.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Whether complete records are cached at all.
    ///
    /// Set via `NUTRISCAN_CACHE_ENABLED`.
    #[serde(default = "default_true")]
    pub cache_enabled: bool,
}

fn default_base_url() -> String {
    "https://world.openfoodfacts.org".into()
}

fn default_user_agent() -> String {
    concat!(
        "nutriscan/",
        env!("CARGO_PKG_VERSION"),
        " (https://github.com/nutriscan/nutriscan)"
    )
    .into()
}

const fn default_timeout_ms() -> u64 {
    15_000
}

const fn default_cache_ttl_secs() -> u64 {
    600
}

const fn default_true() -> bool {
    true
}

impl Default for NutriConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_enabled: true,
        }
    }
}

impl NutriConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache time-to-live as a [`Duration`].
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from the environment, the file named by
    /// `NUTRISCAN_CONFIG_FILE` if set, and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source cannot be parsed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Like [`load`](Self::load), but an explicit `config_file` takes the
    /// place of `NUTRISCAN_CONFIG_FILE`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a source cannot be parsed or validation fails.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let config_file = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from));
        if let Some(path) = config_file {
            if !path.is_file() {
                return Err(ConfigError::LoadFailed(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = NutriConfig::default();
        assert_eq!(config.base_url, "https://world.openfoodfacts.org");
        assert!(config.user_agent.starts_with("nutriscan/"));
        assert_eq!(config.timeout(), Duration::from_secs(15));
        assert_eq!(config.cache_ttl(), Duration::from_secs(600));
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_load_defaults() {
        Jail::expect_with(|_jail| {
            let config = NutriConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config, NutriConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("NUTRISCAN_TIMEOUT_MS", "2500");
            jail.set_env("NUTRISCAN_CACHE_ENABLED", "false");
            jail.set_env("NUTRISCAN_BASE_URL", "https://fr.openfoodfacts.org");

            let config = NutriConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.timeout(), Duration::from_millis(2500));
            assert!(!config.cache_enabled);
            assert_eq!(config.base_url, "https://fr.openfoodfacts.org");
            Ok(())
        });
    }

    #[test]
    fn test_file_then_env_precedence() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "nutriscan.toml",
                r#"
                    cache_ttl_secs = 60
                    timeout_ms = 5000
                "#,
            )?;
            jail.set_env("NUTRISCAN_CONFIG_FILE", "nutriscan.toml");
            jail.set_env("NUTRISCAN_TIMEOUT_MS", "7000");

            let config = NutriConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.cache_ttl(), Duration::from_secs(60));
            assert_eq!(config.timeout_ms, 7000);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_file() {
        Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "user_agent = \"kiosk/2.0\"")?;

            let config =
                NutriConfig::load_from(Some(Path::new("custom.toml"))).map_err(|e| e.to_string())?;
            assert_eq!(config.user_agent, "kiosk/2.0");
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        Jail::expect_with(|_jail| {
            let result = NutriConfig::load_from(Some(Path::new("absent.toml")));
            assert!(matches!(result, Err(ConfigError::LoadFailed(_))));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_env_value() {
        Jail::expect_with(|jail| {
            jail.set_env("NUTRISCAN_CACHE_TTL_SECS", "0");

            let result = NutriConfig::load();
            assert!(
                matches!(result, Err(ConfigError::Invalid { ref field, .. }) if field == "cache_ttl_secs")
            );
            Ok(())
        });
    }
}

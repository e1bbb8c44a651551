//! Configuration validation rules.

use crate::config::NutriConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    /// A value is out of range.
    #[error("invalid configuration: {field} - {reason}")]
    Invalid {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<ConfigError> for nutriscan_core::NutriError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl NutriConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `base_url` is not an http(s) URL
    /// - `user_agent` is empty
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_ttl_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(invalid("base_url", "must be an http or https URL"));
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid(
                "cache_ttl_secs",
                "must be greater than 0 (set cache_enabled = false to disable caching)",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(NutriConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let config = NutriConfig {
            base_url: "ftp://example.org".into(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "base_url"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = NutriConfig {
            user_agent: "  ".into(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_timeout_bounds() {
        let too_small = NutriConfig {
            timeout_ms: 99,
            ..Default::default()
        };
        let too_large = NutriConfig {
            timeout_ms: 300_001,
            ..Default::default()
        };
        assert!(matches!(too_small.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
        assert!(matches!(too_large.validate(), Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));

        let edges = [100, 300_000].map(|timeout_ms| NutriConfig {
            timeout_ms,
            ..Default::default()
        });
        assert!(edges.iter().all(|c| c.validate().is_ok()));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let config = NutriConfig {
            cache_ttl_secs: 0,
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "cache_ttl_secs"));
    }

    #[test]
    fn test_into_nutri_error() {
        let err: nutriscan_core::NutriError = invalid("timeout_ms", "too small").into();
        assert!(matches!(err, nutriscan_core::NutriError::Config(msg) if msg.contains("timeout_ms")));
    }
}

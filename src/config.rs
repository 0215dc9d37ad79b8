//! Client configuration: API endpoints, where the session is persisted and
//! the transport deadline. Values are public; do not store secrets here.

use std::{path::PathBuf, time::Duration};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3003/api/users";
pub const DEFAULT_HEALTH_URL: &str = "http://localhost:3003/api/ping";
pub const DEFAULT_STATE_DIR: &str = ".idgate";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_REAUTH_PATH: &str = "/user/reset";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {name} URL {value:?}: {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("timeout must be greater than zero")]
    ZeroTimeout,
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub health_url: String,
    pub state_dir: PathBuf,
    pub timeout: Duration,
    pub reauth_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            health_url: DEFAULT_HEALTH_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            reauth_path: DEFAULT_REAUTH_PATH.to_string(),
        }
    }
}

/// Optional values layered over the defaults, typically from CLI args or env.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub health_url: Option<String>,
    pub state_dir: Option<String>,
    pub timeout_ms: Option<u64>,
    pub reauth_path: Option<String>,
}

impl ClientConfig {
    /// Applies `overrides` over the defaults and validates the result.
    ///
    /// # Errors
    /// Returns `ConfigError` if a URL does not parse or the timeout is zero.
    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        apply_overrides(&mut config, overrides);
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `ConfigError` if a URL does not parse or the timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("API", &self.api_base_url)?;
        check_url("health", &self.health_url)?;
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn apply_overrides(config: &mut ClientConfig, overrides: ConfigOverrides) {
    if let Some(value) = overrides.api_base_url.as_deref().and_then(normalize_value) {
        config.api_base_url = value.trim_end_matches('/').to_string();
    }
    if let Some(value) = overrides.health_url.as_deref().and_then(normalize_value) {
        config.health_url = value;
    }
    if let Some(value) = overrides.state_dir.as_deref().and_then(normalize_value) {
        config.state_dir = PathBuf::from(value);
    }
    if let Some(value) = overrides.timeout_ms {
        config.timeout = Duration::from_millis(value);
    }
    if let Some(value) = overrides.reauth_path.as_deref().and_then(normalize_value) {
        config.reauth_path = value;
    }
}

fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value).map(drop).map_err(|err| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: err.to_string(),
    })
}

fn normalize_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_value_trims_and_rejects_empty() {
        assert_eq!(normalize_value(""), None);
        assert_eq!(normalize_value("   "), None);
        assert_eq!(
            normalize_value("  https://api.example.com "),
            Some("https://api.example.com".to_string())
        );
    }

    #[test]
    fn load_without_overrides_uses_defaults() {
        let config = ClientConfig::load(ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.health_url, DEFAULT_HEALTH_URL);
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
        assert_eq!(config.timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(config.reauth_path, DEFAULT_REAUTH_PATH);
    }

    #[test]
    fn overrides_ignore_blank_values_and_trim_trailing_slash() {
        let config = ClientConfig::load(ConfigOverrides {
            api_base_url: Some(" https://api.example.com/users/ ".to_string()),
            health_url: Some("   ".to_string()),
            state_dir: Some(String::new()),
            timeout_ms: Some(2500),
            reauth_path: None,
        })
        .unwrap();
        assert_eq!(config.api_base_url, "https://api.example.com/users");
        assert_eq!(config.health_url, DEFAULT_HEALTH_URL);
        assert_eq!(config.state_dir, PathBuf::from(DEFAULT_STATE_DIR));
        assert_eq!(config.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = ClientConfig::load(ConfigOverrides {
            api_base_url: Some("not a url".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { name: "API", .. }));

        let err = ClientConfig::load(ConfigOverrides {
            timeout_ms: Some(0),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
        assert_eq!(err, ConfigError::ZeroTimeout);
    }
}

//! Content provider configuration
//!
//! Configuration is plain data. It can be deserialized from any serde source
//! or loaded from environment variables with defaults that reproduce the
//! classic behaviour: no fallback locale, no local expiry, no timeouts.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Configuration consumed by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LexisConfig {
    /// Locale consulted when the requested locale has no value for a name.
    /// Empty means a request for the empty locale never resolves.
    pub fallback: String,

    /// Lifetime of a block in the in-process tier. `None` keeps a block
    /// until a write through the same provider invalidates it.
    pub local_ttl: Option<Duration>,

    /// Upper bound for every cache store and persistence call.
    /// `None` waits as long as the collaborator does.
    pub collaborator_timeout: Option<Duration>,
}

impl LexisConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fallback locale.
    pub fn with_fallback(mut self, locale: impl Into<String>) -> Self {
        self.fallback = locale.into();
        self
    }

    /// Set the in-process tier TTL.
    pub fn with_local_ttl(mut self, ttl: Duration) -> Self {
        self.local_ttl = Some(ttl);
        self
    }

    /// Set the collaborator timeout.
    pub fn with_collaborator_timeout(mut self, timeout: Duration) -> Self {
        self.collaborator_timeout = Some(timeout);
        self
    }

    /// Create LexisConfig from environment variables.
    ///
    /// Environment variables:
    /// - `LEXIS_FALLBACK_LOCALE`: fallback locale (default: empty)
    /// - `LEXIS_LOCAL_TTL_SECS`: in-process TTL in seconds (default: none)
    /// - `LEXIS_COLLABORATOR_TIMEOUT_MS`: per-call timeout in milliseconds (default: none)
    pub fn from_env() -> Self {
        let fallback = std::env::var("LEXIS_FALLBACK_LOCALE").unwrap_or_default();

        let local_ttl = std::env::var("LEXIS_LOCAL_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs);

        let collaborator_timeout = std::env::var("LEXIS_COLLABORATOR_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_millis);

        Self {
            fallback,
            local_ttl,
            collaborator_timeout,
        }
    }

    /// Reject settings that would make every call fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collaborator_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue {
                field: "collaborator_timeout".to_string(),
                value: "0".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LexisConfig::default();
        assert_eq!(config.fallback, "");
        assert_eq!(config.local_ttl, None);
        assert_eq!(config.collaborator_timeout, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = LexisConfig::new()
            .with_fallback("en")
            .with_local_ttl(Duration::from_secs(300))
            .with_collaborator_timeout(Duration::from_millis(500));

        assert_eq!(config.fallback, "en");
        assert_eq!(config.local_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.collaborator_timeout, Some(Duration::from_millis(500)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = LexisConfig::new().with_collaborator_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_deserialize_fallback_only() {
        let config: LexisConfig =
            serde_json::from_str(r#"{"fallback":"en"}"#).expect("valid config json");
        assert_eq!(config.fallback, "en");
        assert_eq!(config.local_ttl, None);
    }

    #[test]
    fn test_deserialize_empty_object() {
        let config: LexisConfig = serde_json::from_str("{}").expect("valid config json");
        assert_eq!(config, LexisConfig::default());
    }
}

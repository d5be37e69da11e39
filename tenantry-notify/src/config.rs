//! Mail relay configuration.
//!
//! Loaded from environment variables with defaults suitable for local
//! development.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Mail relay configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Base URL of the mail relay API.
    pub api_url: String,

    /// Bearer key for the relay.
    pub api_key: Option<String>,

    /// Sender address.
    pub from_email: String,

    /// Sender display name.
    pub from_name: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum delivery attempts per message.
    pub max_retries: u32,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8025".to_string(),
            api_key: None,
            from_email: "no-reply@tenantry.local".to_string(),
            from_name: "Tenantry".to_string(),
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl MailConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MAIL_API_URL`: relay base URL (default: http://localhost:8025)
    /// - `MAIL_API_KEY`: relay bearer key
    /// - `MAIL_FROM_EMAIL`: sender address (default: no-reply@tenantry.local)
    /// - `MAIL_FROM_NAME`: sender name (default: Tenantry)
    /// - `MAIL_TIMEOUT_SECS`: request timeout (default: 10)
    /// - `MAIL_MAX_RETRIES`: delivery attempts (default: 3)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            api_url: std::env::var("MAIL_API_URL").unwrap_or(default.api_url),
            api_key: std::env::var("MAIL_API_KEY").ok().filter(|k| !k.is_empty()),
            from_email: std::env::var("MAIL_FROM_EMAIL").unwrap_or(default.from_email),
            from_name: std::env::var("MAIL_FROM_NAME").unwrap_or(default.from_name),
            timeout_secs: std::env::var("MAIL_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            max_retries: std::env::var("MAIL_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
        }
    }

    /// Point the config at another relay.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the relay key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Request timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Build a full URL by appending a path to the base URL.
    pub fn url(&self, path: &str) -> String {
        let base = self.api_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{}/{}", base, path)
    }

    /// Check that a production deployment can actually send mail.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::MissingEnvVar("MAIL_API_KEY".to_string()));
        }
        if !self.from_email.contains('@') {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_FROM_EMAIL".to_string(),
                message: format!("'{}' is not an email address", self.from_email),
            });
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAIL_MAX_RETRIES".to_string(),
                message: "must be at least 1".to_string(),
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
        let config = MailConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.max_retries, 3);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_url_joining() {
        let config = MailConfig::default().with_api_url("https://mail.example.com/");
        assert_eq!(config.url("/v1/messages"), "https://mail.example.com/v1/messages");
        assert_eq!(config.url("v1/messages"), "https://mail.example.com/v1/messages");
    }

    #[test]
    fn test_validate_for_production() {
        assert!(matches!(
            MailConfig::default().validate_for_production(),
            Err(ConfigError::MissingEnvVar(_))
        ));
        assert!(MailConfig::default()
            .with_api_key("key")
            .validate_for_production()
            .is_ok());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = MailConfig::default().with_api_key("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}

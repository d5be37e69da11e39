//! Service configuration.
//!
//! Settings are an explicit value handed to [`Tenantry`](crate::Tenantry)
//! at construction. Loaded from environment variables with defaults
//! suitable for local development.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tenantry_auth::password::DEFAULT_MIN_PASSWORD_LENGTH;
use tenantry_org::{INVITATION_TTL_DAYS, MEMBER_ROLE_NAME};
use thiserror::Error;

use crate::error::{CoreError, CoreResult};

/// Development-only signing secret.
const DEV_SECRET_KEY: &str = "tenantry-development-secret-key-change-me";

/// Minimum secret length accepted in production.
const MIN_SECRET_LEN: usize = 32;

/// Longest accepted access token lifetime, one year in minutes.
pub const MAX_ACCESS_TOKEN_MINUTES: i64 = 60 * 24 * 366;

/// Longest accepted invitation lifetime.
pub const MAX_INVITATION_TTL_DAYS: i64 = 366;

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

/// Service settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// HMAC secret for access and reset tokens.
    pub secret_key: String,

    /// Access token lifetime in minutes.
    pub access_token_minutes: i64,

    /// Frontend base URL used in email links.
    pub frontend_url: String,

    /// Days an invitation stays redeemable.
    pub invitation_ttl_days: i64,

    /// Role granted when a join request is approved without an explicit role.
    pub default_member_role: String,

    /// Create placeholder accounts for invited emails with no account.
    pub provision_invited_accounts: bool,

    /// Minimum password length.
    pub min_password_length: usize,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("secret_key", &"[REDACTED]")
            .field("access_token_minutes", &self.access_token_minutes)
            .field("frontend_url", &self.frontend_url)
            .field("invitation_ttl_days", &self.invitation_ttl_days)
            .field("default_member_role", &self.default_member_role)
            .field("provision_invited_accounts", &self.provision_invited_accounts)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

impl Default for Settings {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET_KEY.to_string(),
            access_token_minutes: 60 * 24 * 8,
            frontend_url: "http://localhost:3000".to_string(),
            invitation_ttl_days: INVITATION_TTL_DAYS,
            default_member_role: MEMBER_ROLE_NAME.to_string(),
            provision_invited_accounts: false,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Environment variables:
    /// - `TENANTRY_SECRET_KEY`: token signing secret
    /// - `TENANTRY_ACCESS_TOKEN_MINUTES`: access token lifetime (default: 11520, 8 days)
    /// - `TENANTRY_FRONTEND_URL`: link base URL (default: http://localhost:3000)
    /// - `TENANTRY_INVITATION_TTL_DAYS`: invitation lifetime (default: 7)
    /// - `TENANTRY_DEFAULT_MEMBER_ROLE`: role for approved join requests (default: Member)
    /// - `TENANTRY_PROVISION_INVITED_ACCOUNTS`: create invited accounts (default: false)
    /// - `TENANTRY_MIN_PASSWORD_LENGTH`: password minimum (default: 8)
    ///
    /// # Errors
    ///
    /// `InvalidValue` if a numeric variable does not parse or a lifetime
    /// is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let default = Self::default();

        let settings = Self {
            secret_key: std::env::var("TENANTRY_SECRET_KEY").unwrap_or(default.secret_key),
            access_token_minutes: env_number(
                "TENANTRY_ACCESS_TOKEN_MINUTES",
                default.access_token_minutes,
            )?,
            frontend_url: std::env::var("TENANTRY_FRONTEND_URL").unwrap_or(default.frontend_url),
            invitation_ttl_days: env_number(
                "TENANTRY_INVITATION_TTL_DAYS",
                default.invitation_ttl_days,
            )?,
            default_member_role: std::env::var("TENANTRY_DEFAULT_MEMBER_ROLE")
                .unwrap_or(default.default_member_role),
            provision_invited_accounts: std::env::var("TENANTRY_PROVISION_INVITED_ACCOUNTS")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(default.provision_invited_accounts),
            min_password_length: env_number(
                "TENANTRY_MIN_PASSWORD_LENGTH",
                default.min_password_length,
            )?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Set the signing secret.
    pub fn with_secret_key(mut self, secret: impl Into<String>) -> Self {
        self.secret_key = secret.into();
        self
    }

    /// Set the frontend URL.
    pub fn with_frontend_url(mut self, url: impl Into<String>) -> Self {
        self.frontend_url = url.into();
        self
    }

    /// Toggle invited-account provisioning.
    pub fn with_provisioned_invites(mut self, enabled: bool) -> Self {
        self.provision_invited_accounts = enabled;
        self
    }

    /// Access token lifetime.
    pub fn access_token_ttl(&self) -> CoreResult<Duration> {
        bounded(self.access_token_minutes, MAX_ACCESS_TOKEN_MINUTES)
            .and_then(Duration::try_minutes)
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "access token lifetime out of range: {} minutes",
                    self.access_token_minutes
                ))
            })
    }

    /// Invitation lifetime.
    pub fn invitation_ttl(&self) -> CoreResult<Duration> {
        bounded(self.invitation_ttl_days, MAX_INVITATION_TTL_DAYS)
            .and_then(Duration::try_days)
            .ok_or_else(|| {
                CoreError::Internal(format!(
                    "invitation lifetime out of range: {} days",
                    self.invitation_ttl_days
                ))
            })
    }

    /// Check that the lifetimes are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if bounded(self.access_token_minutes, MAX_ACCESS_TOKEN_MINUTES).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "TENANTRY_ACCESS_TOKEN_MINUTES".to_string(),
                message: format!("must be between 1 and {}", MAX_ACCESS_TOKEN_MINUTES),
            });
        }
        if bounded(self.invitation_ttl_days, MAX_INVITATION_TTL_DAYS).is_none() {
            return Err(ConfigError::InvalidValue {
                key: "TENANTRY_INVITATION_TTL_DAYS".to_string(),
                message: format!("must be between 1 and {}", MAX_INVITATION_TTL_DAYS),
            });
        }
        Ok(())
    }

    /// Validate settings for a production deployment.
    pub fn validate_for_production(&self) -> Result<(), ConfigError> {
        if self.secret_key.is_empty() || self.secret_key == DEV_SECRET_KEY {
            return Err(ConfigError::MissingEnvVar("TENANTRY_SECRET_KEY".to_string()));
        }
        if self.secret_key.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                key: "TENANTRY_SECRET_KEY".to_string(),
                message: format!("must be at least {} bytes", MIN_SECRET_LEN),
            });
        }
        self.validate()?;
        if !self.frontend_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "TENANTRY_FRONTEND_URL".to_string(),
                message: "must use https".to_string(),
            });
        }
        Ok(())
    }
}

fn bounded(value: i64, max: i64) -> Option<i64> {
    (1..=max).contains(&value).then_some(value)
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("not a number: {}", raw),
        }),
        Err(_) => Ok(default),
    }
}

//! Error types for authentication operations
//!
//! This module defines the errors that can occur while hashing credentials
//! and issuing or validating tokens.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// JWT token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// JWT token is invalid (malformed, bad signature, wrong type, etc.)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Email or password did not match
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Password rejected by the policy
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// Hashing backend failure
    #[error("Hashing error: {0}")]
    Hashing(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Invalid credentials and bad tokens are expected traffic.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::Internal(_) | AuthError::ConfigError(_) | AuthError::Hashing(_)
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TokenExpired | AuthError::InvalidToken(_) | AuthError::InvalidCredentials => {
                401
            }
            AuthError::WeakPassword(_) => 400,
            AuthError::Hashing(_) | AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::Hashing(_) => "HASHING_ERROR",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::WeakPassword("short".into()).status_code(), 400);
        assert_eq!(AuthError::Hashing("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_server_errors() {
        assert!(AuthError::ConfigError("x".into()).is_server_error());
        assert!(!AuthError::InvalidCredentials.is_server_error());
    }
}

//! Error types for the Tenantry services
//!
//! Every failure surfaces as one of a small set of kinds. Email delivery
//! failures are not errors; see [`Outcome`](crate::Outcome).

use crate::config::ConfigError;
use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use tenantry_auth::AuthError;
use tenantry_rbac::DenyReason;
use thiserror::Error;

/// Coarse error category, stable across messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entity absent, or belongs to another organization
    NotFound,
    /// Duplicate or state conflict
    Conflict,
    /// Authenticated but not allowed
    Forbidden,
    /// Past its validity window
    Expired,
    /// Malformed input or unknown transition target
    Invalid,
    /// Missing or bad credentials
    Unauthenticated,
    /// Unexpected failure
    Internal,
}

/// Service error.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity absent or outside the caller's organization
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity type
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Duplicate name, duplicate pending record, or already-resolved state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Authorization denied
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Token or record past expiry
    #[error("Expired: {0}")]
    Expired(String),

    /// Malformed input
    #[error("Invalid: {0}")]
    Invalid(String),

    /// Bad credentials or bearer token
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for service operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Forbidden(_) => ErrorKind::Forbidden,
            CoreError::Expired(_) => ErrorKind::Expired,
            CoreError::Invalid(_) => ErrorKind::Invalid,
            CoreError::Unauthenticated(_) => ErrorKind::Unauthenticated,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error should be logged at error level.
    pub fn is_server_error(&self) -> bool {
        matches!(self, CoreError::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Forbidden => 403,
            ErrorKind::Expired => 410,
            ErrorKind::Invalid => 400,
            ErrorKind::Unauthenticated => 401,
            ErrorKind::Internal => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::Expired => "EXPIRED",
            ErrorKind::Invalid => "INVALID",
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation { .. } => CoreError::Conflict(err.to_string()),
            StoreError::Dangling { entity, id } => CoreError::NotFound {
                entity,
                id: id.to_string(),
            },
        }
    }
}

impl From<AuthError> for CoreError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired => CoreError::Expired(err.to_string()),
            AuthError::InvalidToken(_) => CoreError::Invalid(err.to_string()),
            AuthError::InvalidCredentials => CoreError::Unauthenticated(err.to_string()),
            AuthError::WeakPassword(msg) => CoreError::Invalid(msg),
            AuthError::Hashing(_) | AuthError::ConfigError(_) | AuthError::Internal(_) => {
                CoreError::Internal(err.to_string())
            }
        }
    }
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        CoreError::Internal(err.to_string())
    }
}

impl From<DenyReason> for CoreError {
    fn from(reason: DenyReason) -> Self {
        CoreError::Forbidden(reason.message())
    }
}

//! JWT claims
//!
//! A single claims shape covers both token kinds the system signs; the
//! `token_type` claim keeps a reset token from being used as an access
//! token and vice versa.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default token issuer.
pub const DEFAULT_ISSUER: &str = "tenantry";

/// Kind of signed token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Bearer token for API access
    Access,
    /// Single-purpose password reset token
    PasswordReset,
}

impl TokenType {
    /// Get the token type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Claims carried by Tenantry tokens.
///
/// # Example
///
/// ```rust
/// use chrono::Duration;
/// use tenantry_auth::claims::AccessClaims;
/// use uuid::Uuid;
///
/// let user_id = Uuid::now_v7();
/// let claims = AccessClaims::new(user_id.to_string(), "user@example.com", Duration::hours(1));
/// assert_eq!(claims.user_id(), Some(user_id));
/// assert!(!claims.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user ID for access tokens, the email for reset tokens
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID
    pub jti: String,

    /// User email
    pub email: String,

    /// Token type
    pub token_type: TokenType,
}

impl AccessClaims {
    /// Create access claims valid for `duration`.
    pub fn new(subject: impl Into<String>, email: impl Into<String>, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: subject.into(),
            iss: DEFAULT_ISSUER.to_string(),
            exp: (now + duration).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            email: email.into(),
            token_type: TokenType::Access,
        }
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self
    }

    /// Get the user ID as UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }
}

//! JWT token generation and validation
//!
//! Tokens are HMAC-signed with the configured secret using the
//! jsonwebtoken crate.

use crate::claims::{AccessClaims, TokenType, DEFAULT_ISSUER};
use crate::error::{AuthError, AuthResult};
use chrono::Duration;
use uuid::Uuid;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};

/// Lifetime of a password reset token.
pub const PASSWORD_RESET_TTL_HOURS: i64 = 24;

/// JWT configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,

    /// HMAC algorithm (HS256, HS384 or HS512)
    pub algorithm: Algorithm,

    /// Token issuer
    pub issuer: String,

    /// Password reset token duration
    pub reset_token_duration: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"[REDACTED]")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("reset_token_duration", &self.reset_token_duration)
            .finish()
    }
}

impl JwtConfig {
    /// Create an HS256 configuration with the given secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            algorithm: Algorithm::HS256,
            issuer: DEFAULT_ISSUER.to_string(),
            reset_token_duration: Duration::hours(PASSWORD_RESET_TTL_HOURS),
        }
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - JWT configuration
    ///
    /// # Returns
    ///
    /// JWT service or configuration error
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        if !matches!(
            config.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::ConfigError(format!(
                "Unsupported algorithm {:?}; only HMAC is supported",
                config.algorithm
            )));
        }
        if config.secret.is_empty() {
            return Err(AuthError::ConfigError("Secret required for HMAC".to_string()));
        }

        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256).
    ///
    /// # Arguments
    ///
    /// * `secret` - The secret key for HMAC
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig::new(secret))
    }

    /// Issue an access token for a user.
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user's unique identifier
    /// * `email` - The user's email address
    /// * `ttl` - How long the token stays valid
    ///
    /// # Returns
    ///
    /// Encoded JWT token string
    pub fn issue_access_token(
        &self,
        user_id: Uuid,
        email: impl Into<String>,
        ttl: Duration,
    ) -> AuthResult<String> {
        let claims =
            AccessClaims::new(user_id.to_string(), email, ttl).with_issuer(&self.config.issuer);
        self.encode_claims(&claims)
    }

    /// Validate an access token.
    ///
    /// Reset tokens are rejected even when their signature is valid.
    pub fn validate_access_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::Access {
            return Err(AuthError::InvalidToken(format!(
                "expected access token, got {}",
                claims.token_type.as_str()
            )));
        }
        if claims.user_id().is_none() {
            return Err(AuthError::InvalidToken("Subject is not a user ID".to_string()));
        }
        Ok(claims)
    }

    /// Issue a password reset token bound to an email address.
    pub fn issue_password_reset_token(&self, email: impl Into<String>) -> AuthResult<String> {
        let email = email.into();
        let claims = AccessClaims::new(email.clone(), email, self.config.reset_token_duration)
            .with_issuer(&self.config.issuer)
            .with_token_type(TokenType::PasswordReset);
        self.encode_claims(&claims)
    }

    /// Verify a password reset token and return the email it was issued for.
    pub fn verify_password_reset_token(&self, token: &str) -> AuthResult<String> {
        let claims = self.validate_token(token)?;
        if claims.token_type != TokenType::PasswordReset {
            return Err(AuthError::InvalidToken(format!(
                "expected password reset token, got {}",
                claims.token_type.as_str()
            )));
        }
        Ok(claims.email)
    }

    /// Encode existing claims.
    pub fn encode_claims(&self, claims: &AccessClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm);
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Validate and decode a token of any type.
    ///
    /// # Arguments
    ///
    /// * `token` - The JWT token string
    ///
    /// # Returns
    ///
    /// Decoded claims if valid
    pub fn validate_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = Validation::new(self.config.algorithm);
        validation.set_issuer(&[&self.config.issuer]);
        validation.validate_aud = false;

        let token_data: TokenData<AccessClaims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    #[test]
    fn test_jwt_service_creation() {
        let service = JwtService::with_secret(test_secret()).unwrap();
        assert_eq!(service.config().algorithm, Algorithm::HS256);
    }

    #[test]
    fn test_rejects_empty_secret() {
        let result = JwtService::with_secret("");
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_asymmetric_algorithm() {
        let result = JwtService::new(JwtConfig::new(test_secret()).with_algorithm(Algorithm::RS256));
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = JwtService::with_secret(test_secret()).unwrap();
        let user_id = Uuid::now_v7();

        let token = service
            .issue_access_token(user_id, "test@example.com", Duration::hours(1))
            .unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.email, "test@example.com");
    }

    #[test]
    fn test_invalid_token() {
        let service = JwtService::with_secret(test_secret()).unwrap();
        let result = service.validate_access_token("invalid-token");

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token() {
        let service = JwtService::with_secret(test_secret()).unwrap();
        let token = service
            .issue_access_token(Uuid::now_v7(), "test@example.com", Duration::hours(-2))
            .unwrap();

        let result = service.validate_access_token(&token);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = JwtService::with_secret(test_secret()).unwrap();
        let other = JwtService::with_secret("a-completely-different-signing-secret").unwrap();

        let token = issuer
            .issue_access_token(Uuid::now_v7(), "test@example.com", Duration::hours(1))
            .unwrap();
        assert!(matches!(
            other.validate_access_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_password_reset_token() {
        let service = JwtService::with_secret(test_secret()).unwrap();

        let token = service.issue_password_reset_token("reset@example.com").unwrap();
        assert_eq!(
            service.verify_password_reset_token(&token).unwrap(),
            "reset@example.com"
        );

        // A reset token is not an access token.
        assert!(matches!(
            service.validate_access_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_access_token_is_not_reset_token() {
        let service = JwtService::with_secret(test_secret()).unwrap();
        let token = service
            .issue_access_token(Uuid::now_v7(), "test@example.com", Duration::hours(1))
            .unwrap();

        assert!(matches!(
            service.verify_password_reset_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }
}

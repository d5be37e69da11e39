//! # Tenantry Authentication
//!
//! Credential and token primitives used by the Tenantry services.
//!
//! ## Overview
//!
//! The tenantry-auth crate handles:
//! - **Passwords**: Argon2id hashing behind the [`CredentialHasher`] trait,
//!   plus a minimum-length [`PasswordPolicy`]
//! - **JWT**: Signed access tokens and password reset tokens
//! - **Opaque tokens**: Random invitation tokens and their SHA-256 digests
//!
//! ## Features
//!
//! - `jwt` (default): JWT token support using jsonwebtoken
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Duration;
//! use tenantry_auth::{JwtService, TokenType};
//! use uuid::Uuid;
//!
//! let service = JwtService::with_secret("your-secret-key").unwrap();
//!
//! let user_id = Uuid::now_v7();
//! let token = service
//!     .issue_access_token(user_id, "user@example.com", Duration::hours(1))
//!     .unwrap();
//!
//! let claims = service.validate_access_token(&token).unwrap();
//! assert_eq!(claims.user_id(), Some(user_id));
//! assert_eq!(claims.token_type, TokenType::Access);
//! ```
//!
//! ### Invitation tokens
//!
//! ```rust
//! use tenantry_auth::tokens::{hash_token, issue_invitation_token};
//!
//! let token = issue_invitation_token();
//! assert_eq!(hash_token(&token.plaintext), token.digest);
//! ```

pub mod claims;
pub mod error;
#[cfg(feature = "jwt")]
pub mod jwt;
pub mod password;
pub mod tokens;

// Re-export main types
pub use claims::{AccessClaims, TokenType};
pub use error::{AuthError, AuthResult};
pub use password::{Argon2Hasher, CredentialHasher, PasswordPolicy};
pub use tokens::{generate_temp_password, hash_token, issue_invitation_token, IssuedToken};

#[cfg(feature = "jwt")]
pub use jwt::{JwtConfig, JwtService, PASSWORD_RESET_TTL_HOURS};

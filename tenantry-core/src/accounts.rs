//! Accounts: registration, sign-in and password reset.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tenantry_auth::AuthError;
use tenantry_notify::Notification;
use tenantry_org::User;
use tracing::{info, instrument, warn};

use crate::error::{CoreError, CoreResult};
use crate::service::{Outcome, Tenantry};

/// Token type reported alongside access tokens.
pub const BEARER: &str = "bearer";

/// Input for [`Tenantry::register`].
#[derive(Clone, Serialize, Deserialize)]
pub struct NewAccount {
    /// Email address, unique ignoring case
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Display name
    pub full_name: Option<String>,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("full_name", &self.full_name)
            .finish()
    }
}

impl NewAccount {
    /// Account with an email and password.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            full_name: None,
        }
    }

    /// Set the display name.
    pub fn with_full_name(mut self, full_name: impl Into<String>) -> Self {
        self.full_name = Some(full_name.into());
        self
    }
}

/// A signed access token.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Encoded JWT
    pub token: String,
    /// Always `bearer`
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Trim and sanity-check an email address.
pub(crate) fn normalize_email(email: &str) -> CoreResult<String> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(email.to_string())
    } else {
        Err(CoreError::Invalid(format!("invalid email address: {}", email)))
    }
}

impl Tenantry {
    /// Register an active account.
    ///
    /// # Errors
    ///
    /// - `Invalid` for a malformed email or a password below the minimum length
    /// - `Conflict` if the email is taken
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn register(&self, account: NewAccount) -> CoreResult<User> {
        let user = self.new_user(account)?;
        self.insert_user(user).await
    }

    /// Create a superuser account. Intended for bootstrapping.
    #[instrument(skip(self, account), fields(email = %account.email))]
    pub async fn create_superuser(&self, account: NewAccount) -> CoreResult<User> {
        let user = self.new_user(account)?.with_superuser();
        let user = self.insert_user(user).await?;
        warn!(user_id = %user.id, "Superuser created");
        Ok(user)
    }

    fn new_user(&self, account: NewAccount) -> CoreResult<User> {
        let email = normalize_email(&account.email)?;
        self.password_policy.validate(&account.password)?;
        let hash = self.hasher.hash(&account.password)?;
        Ok(User::new(email, hash, account.full_name))
    }

    async fn insert_user(&self, user: User) -> CoreResult<User> {
        let user = self
            .store
            .transaction(|t| {
                if t.user_by_email(&user.email).is_some() {
                    return Err(CoreError::Conflict(format!(
                        "email {} is already registered",
                        user.email
                    )));
                }
                t.put_user(user.clone())?;
                Ok(user)
            })
            .await?;

        info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Exchange credentials for an access token.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` for an unknown email or wrong password
    /// - `Forbidden` if the account is inactive
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> CoreResult<AccessToken> {
        let user = self
            .store
            .read(|t| t.user_by_email(email).cloned())
            .await
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login failed");
            return Err(AuthError::InvalidCredentials.into());
        }
        if !user.is_active {
            return Err(CoreError::Forbidden("user account is inactive".to_string()));
        }

        let ttl = self.settings.access_token_ttl()?;
        let token = self.jwt.issue_access_token(user.id, &user.email, ttl)?;
        info!(user_id = %user.id, "User logged in");

        Ok(AccessToken {
            token,
            token_type: BEARER.to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// - `Unauthenticated` if the user no longer exists
    /// - `Invalid` or `Expired` for a bad token
    /// - `Forbidden` if the account is inactive
    pub async fn authenticate(&self, token: &str) -> CoreResult<User> {
        let claims = self.jwt.validate_access_token(token)?;
        let user_id = claims
            .user_id()
            .ok_or_else(|| CoreError::Invalid("token subject is not a user".to_string()))?;
        let user = self
            .store
            .read(|t| t.user(user_id).cloned())
            .await
            .ok_or_else(|| CoreError::Unauthenticated(format!("unknown user {}", user_id)))?;
        if !user.is_active {
            return Err(CoreError::Forbidden("user account is inactive".to_string()));
        }
        Ok(user)
    }

    /// Email a password reset link.
    ///
    /// Delivery failure is reported as a warning, not an error.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn request_password_reset(&self, email: &str) -> CoreResult<Outcome<()>> {
        let user = self
            .store
            .read(|t| t.user_by_email(email).cloned())
            .await
            .ok_or_else(|| CoreError::not_found("user", email.trim()))?;

        let token = self.jwt.issue_password_reset_token(&user.email)?;
        let report = self
            .dispatcher
            .deliver(&user.email, &Notification::PasswordReset { token })
            .await;

        info!(user_id = %user.id, "Password reset requested");
        Ok(Outcome::new(()).with_report(report))
    }

    /// Set a new password using a reset token.
    #[instrument(skip(self, token, new_password))]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> CoreResult<()> {
        let email = self.jwt.verify_password_reset_token(token)?;
        self.password_policy.validate(new_password)?;
        let hash = self.hasher.hash(new_password)?;

        let user_id = self
            .store
            .transaction(|t| {
                let mut user = t
                    .user_by_email(&email)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found("user", &email))?;
                if !user.is_active {
                    return Err(CoreError::Forbidden("user account is inactive".to_string()));
                }
                user.password_hash = hash;
                user.updated_at = Utc::now();
                let id = user.id;
                t.put_user(user)?;
                Ok(id)
            })
            .await?;

        info!(user_id = %user_id, "Password reset");
        Ok(())
    }
}

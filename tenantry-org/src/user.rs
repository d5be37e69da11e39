//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a user account.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered, awaiting activation
    Pending,
    /// Fully active
    Active,
    /// Rejected by an administrator
    Rejected,
    /// Created on behalf of an invitation that has not been accepted yet
    Invited,
}

impl UserStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Rejected => "rejected",
            Self::Invited => "invited",
        }
    }

    /// Parse a status from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "rejected" => Some(Self::Rejected),
            "invited" => Some(Self::Invited),
            _ => None,
        }
    }
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// A user account.
///
/// Email addresses are unique across the system. The credential is stored
/// as an encoded password hash; hashing itself lives in `tenantry-auth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Email address (unique, case-insensitive)
    pub email: String,

    /// Encoded credential hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Display name
    pub full_name: Option<String>,

    /// Whether the account may sign in
    pub is_active: bool,

    /// Superusers pass every authorization check
    pub is_superuser: bool,

    /// Lifecycle status
    pub status: UserStatus,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new active, non-superuser account.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: email.into().trim().to_string(),
            password_hash: password_hash.into(),
            full_name,
            is_active: true,
            is_superuser: false,
            status: UserStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates a placeholder account for an invited email address.
    ///
    /// The account can sign in with its temporary password; it becomes
    /// `Active` once the invitation is accepted.
    pub fn invited(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            status: UserStatus::Invited,
            ..Self::new(email, password_hash, None)
        }
    }

    /// Promote this account to superuser.
    pub fn with_superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    /// Name to show in notifications: the display name, or the email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }

    /// Normalized email for uniqueness checks.
    pub fn email_key(&self) -> String {
        crate::name_key(&self.email)
    }

    /// Mark an invited account as active.
    pub fn activate(&mut self) {
        self.status = UserStatus::Active;
        self.is_active = true;
        self.updated_at = Utc::now();
    }
}

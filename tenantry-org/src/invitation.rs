//! Invitations
//!
//! An invitation offers an email address a role in an organization. The
//! plaintext token only ever travels in the invitation email; the store
//! keeps its SHA-256 digest.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default number of days an invitation stays redeemable.
pub const INVITATION_TTL_DAYS: i64 = 7;

/// Lifecycle state of an invitation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    /// Waiting to be accepted
    #[default]
    Pending,
    /// Redeemed by the invitee
    Accepted,
    /// Past its expiry
    Expired,
}

impl InvitationStatus {
    /// Get the status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Expired => "expired",
        }
    }

    /// Parse a status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An offer for an email address to join an organization with a role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invitation {
    /// Unique invitation ID
    pub id: Uuid,

    /// Invitee email, compared case-sensitively on acceptance
    pub email: String,

    /// Target organization
    pub organization_id: Uuid,

    /// Who issued the invitation
    pub invited_by: Uuid,

    /// Role granted on acceptance
    pub role_id: Uuid,

    /// Hex SHA-256 digest of the plaintext token
    #[serde(skip_serializing, default)]
    pub token_hash: String,

    /// Stored status; see [`Invitation::effective_status`]
    pub status: InvitationStatus,

    /// When the token stops being redeemable
    pub expires_at: DateTime<Utc>,

    /// When the invitation was created
    pub created_at: DateTime<Utc>,

    /// When the invitation was last changed
    pub updated_at: DateTime<Utc>,
}

impl Invitation {
    /// Creates a pending invitation expiring `ttl` from now.
    pub fn new(
        organization_id: Uuid,
        email: impl Into<String>,
        role_id: Uuid,
        invited_by: Uuid,
        token_hash: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            email: email.into().trim().to_string(),
            organization_id,
            invited_by,
            role_id,
            token_hash: token_hash.into(),
            status: InvitationStatus::Pending,
            expires_at: expiry(now, ttl),
            created_at: now,
            updated_at: now,
        }
    }

    /// Status as observed at `now`.
    ///
    /// A pending invitation past its expiry reads as expired even if the
    /// stored status has not been updated yet.
    pub fn effective_status(&self, now: DateTime<Utc>) -> InvitationStatus {
        match self.status {
            InvitationStatus::Pending if now >= self.expires_at => InvitationStatus::Expired,
            status => status,
        }
    }

    /// Pending and not yet expired.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == InvitationStatus::Pending
    }

    /// Mark as accepted.
    pub fn accept(&mut self) {
        self.status = InvitationStatus::Accepted;
        self.updated_at = Utc::now();
    }

    /// Mark as expired.
    pub fn expire(&mut self) {
        self.status = InvitationStatus::Expired;
        self.updated_at = Utc::now();
    }

    /// Swap in a fresh token and restart the expiry window.
    pub fn reissue(&mut self, token_hash: impl Into<String>, ttl: Duration) {
        let now = Utc::now();
        self.token_hash = token_hash.into();
        self.status = InvitationStatus::Pending;
        self.expires_at = expiry(now, ttl);
        self.updated_at = now;
    }
}

/// `now + ttl`, saturating at the latest representable instant.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    now.checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invitation(ttl: Duration) -> Invitation {
        Invitation::new(
            Uuid::now_v7(),
            "bob@acme.test",
            Uuid::now_v7(),
            Uuid::now_v7(),
            "digest",
            ttl,
        )
    }

    #[test]
    fn test_new_invitation_is_active() {
        let inv = invitation(Duration::days(INVITATION_TTL_DAYS));
        assert_eq!(inv.status, InvitationStatus::Pending);
        assert!(inv.is_active(Utc::now()));
    }

    #[test]
    fn test_effective_status_expires() {
        let inv = invitation(Duration::days(1));
        let later = Utc::now() + Duration::days(2);

        assert_eq!(inv.effective_status(later), InvitationStatus::Expired);
        assert!(!inv.is_active(later));
        assert_eq!(inv.status, InvitationStatus::Pending);
    }

    #[test]
    fn test_accepted_stays_accepted_after_expiry() {
        let mut inv = invitation(Duration::days(1));
        inv.accept();
        let later = Utc::now() + Duration::days(2);
        assert_eq!(inv.effective_status(later), InvitationStatus::Accepted);
    }

    #[test]
    fn test_reissue_resets_window() {
        let mut inv = invitation(Duration::seconds(-5));
        assert!(!inv.is_active(Utc::now()));

        inv.reissue("new-digest", Duration::days(INVITATION_TTL_DAYS));
        assert!(inv.is_active(Utc::now()));
        assert_eq!(inv.token_hash, "new-digest");
    }

    #[test]
    fn test_oversized_ttl_saturates() {
        let inv = invitation(Duration::MAX);
        assert_eq!(inv.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(inv.is_active(Utc::now()));
    }

    #[test]
    fn test_token_hash_not_serialized() {
        let inv = invitation(Duration::days(1));
        let json = serde_json::to_value(&inv).unwrap();
        assert!(json.get("token_hash").is_none());
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(InvitationStatus::parse(" Accepted "), Some(InvitationStatus::Accepted));
        assert_eq!(InvitationStatus::parse("bogus"), None);
    }
}

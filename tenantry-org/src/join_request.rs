//! Self-service join requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a join request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    /// Awaiting a decision
    #[default]
    Pending,
    /// Accepted; a membership was created
    Approved,
    /// Declined
    Rejected,
}

impl JoinRequestStatus {
    /// Get the status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a status name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether a decision has been made.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for JoinRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's request to join an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Unique request ID
    pub id: Uuid,

    /// Requesting user
    pub user_id: Uuid,

    /// Target organization
    pub organization_id: Uuid,

    /// Current status
    pub status: JoinRequestStatus,

    /// Role granted on approval
    pub role_id: Option<Uuid>,

    /// Who approved or rejected the request
    pub resolved_by: Option<Uuid>,

    /// When it was resolved
    pub resolved_at: Option<DateTime<Utc>>,

    /// When the request was made
    pub created_at: DateTime<Utc>,

    /// When the request last changed
    pub updated_at: DateTime<Utc>,
}

impl JoinRequest {
    /// Creates a pending request.
    pub fn new(user_id: Uuid, organization_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            user_id,
            organization_id,
            status: JoinRequestStatus::Pending,
            role_id: None,
            resolved_by: None,
            resolved_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the request is still awaiting a decision.
    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }

    /// Record a decision.
    pub fn resolve(&mut self, status: JoinRequestStatus, resolver: Uuid, role_id: Option<Uuid>) {
        let now = Utc::now();
        self.status = status;
        self.resolved_by = Some(resolver);
        self.resolved_at = Some(now);
        self.role_id = role_id;
        self.updated_at = now;
    }
}

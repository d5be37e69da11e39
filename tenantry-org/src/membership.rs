//! Membership domain models
//!
//! A membership links one user to one organization and carries the set of
//! roles the user holds there. There is at most one membership per
//! (user, organization) pair.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Organization membership linking a user to an organization.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use tenantry_org::Membership;
///
/// let role = Uuid::now_v7();
/// let membership = Membership::new(Uuid::now_v7(), Uuid::now_v7()).with_role(role);
/// assert!(membership.has_role(role));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Unique membership ID
    pub id: Uuid,

    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Roles held within the organization
    #[serde(default)]
    pub role_ids: BTreeSet<Uuid>,

    /// Who invited or approved this user (if applicable)
    pub invited_by: Option<Uuid>,

    /// When the user joined
    pub joined_at: DateTime<Utc>,

    /// When the role set last changed
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// Creates a membership with no roles.
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The organization ID
    /// * `user_id` - The user ID
    pub fn new(organization_id: Uuid, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            organization_id,
            user_id,
            role_ids: BTreeSet::new(),
            invited_by: None,
            joined_at: now,
            updated_at: now,
        }
    }

    /// Add a role.
    pub fn with_role(mut self, role_id: Uuid) -> Self {
        self.role_ids.insert(role_id);
        self
    }

    /// Add an optional role. `None` leaves the set untouched.
    pub fn with_optional_role(mut self, role_id: Option<Uuid>) -> Self {
        if let Some(role_id) = role_id {
            self.role_ids.insert(role_id);
        }
        self
    }

    /// Set who invited this user.
    ///
    /// # Arguments
    ///
    /// * `inviter_id` - The user ID of who invited this user
    pub fn with_inviter(mut self, inviter_id: Uuid) -> Self {
        self.invited_by = Some(inviter_id);
        self
    }

    /// Whether the membership includes the role.
    pub fn has_role(&self, role_id: Uuid) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Add a role. Returns `true` if it was newly added.
    pub fn add_role(&mut self, role_id: Uuid) -> bool {
        let added = self.role_ids.insert(role_id);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove a role. Returns `true` if it was present.
    pub fn remove_role(&mut self, role_id: Uuid) -> bool {
        let removed = self.role_ids.remove(&role_id);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Replace the role set.
    pub fn set_roles(&mut self, role_ids: impl IntoIterator<Item = Uuid>) {
        self.role_ids = role_ids.into_iter().collect();
        self.updated_at = Utc::now();
    }
}

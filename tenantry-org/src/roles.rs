//! Role definitions
//!
//! Roles are named sets of permission IDs scoped to one organization.
//! A role flagged `is_admin` grants administrative standing to every
//! member who holds it, independently of its permission set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Name given to the administrative role created with every organization.
pub const ADMIN_ROLE_NAME: &str = "Admin";

/// Name given to the baseline role created with every organization.
pub const MEMBER_ROLE_NAME: &str = "Member";

/// A role within an organization.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use tenantry_org::Role;
///
/// let org_id = Uuid::now_v7();
/// let perm = Uuid::now_v7();
///
/// let mut editor = Role::new(org_id, "Editor").with_permissions([perm]);
/// assert!(editor.grants(perm));
/// assert!(!editor.is_admin);
///
/// editor.revoke(perm);
/// assert!(editor.permission_ids.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Role name (unique per organization, case-insensitive)
    pub name: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Whether holders of this role are organization admins
    #[serde(default)]
    pub is_admin: bool,

    /// Permissions granted by this role
    #[serde(default)]
    pub permission_ids: BTreeSet<Uuid>,

    /// When the role was created
    pub created_at: DateTime<Utc>,

    /// When the role was last updated
    pub updated_at: DateTime<Utc>,
}

impl Role {
    /// Creates an empty, non-admin role.
    pub fn new(organization_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            organization_id,
            name: name.into().trim().to_string(),
            description: None,
            is_admin: false,
            permission_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Creates the flagged `Admin` role for an organization.
    ///
    /// Permissions are attached separately once the organization's
    /// catalog has been seeded.
    pub fn admin(organization_id: Uuid) -> Self {
        Self::new(organization_id, ADMIN_ROLE_NAME)
            .with_description("Full administrative access to the organization")
            .with_admin(true)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the admin flag.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Replace the permission set.
    pub fn with_permissions(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.permission_ids = ids.into_iter().collect();
        self
    }

    /// Normalized name used for uniqueness checks.
    pub fn name_key(&self) -> String {
        crate::name_key(&self.name)
    }

    /// Whether this role carries the given permission.
    pub fn grants(&self, permission_id: Uuid) -> bool {
        self.permission_ids.contains(&permission_id)
    }

    /// Add a permission. Returns `true` if it was not already present.
    pub fn grant(&mut self, permission_id: Uuid) -> bool {
        let added = self.permission_ids.insert(permission_id);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Remove a permission. Returns `true` if it was present.
    pub fn revoke(&mut self, permission_id: Uuid) -> bool {
        let removed = self.permission_ids.remove(&permission_id);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }

    /// Replace the permission set in place.
    pub fn set_permissions(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        self.permission_ids = ids.into_iter().collect();
        self.updated_at = Utc::now();
    }
}

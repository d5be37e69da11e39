//! Permission rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantry_rbac::{DefaultPermission, PermissionCategory};
use uuid::Uuid;

/// A named permission defined inside one organization.
///
/// Names are unique per organization. Roles reference permissions by ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Unique permission ID
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Name checked by the authorization resolver
    pub name: String,

    /// Human-readable description
    pub description: Option<String>,

    /// Category bucket
    #[serde(default)]
    pub category: PermissionCategory,

    /// When the permission was created
    pub created_at: DateTime<Utc>,

    /// When the permission was last updated
    pub updated_at: DateTime<Utc>,
}

impl Permission {
    /// Creates a permission in the `other` category.
    pub fn new(organization_id: Uuid, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            organization_id,
            name: name.into().trim().to_string(),
            description: None,
            category: PermissionCategory::Other,
            created_at: now,
            updated_at: now,
        }
    }

    /// Materialize a catalog entry for an organization.
    pub fn from_default(organization_id: Uuid, default: &DefaultPermission) -> Self {
        Self::new(organization_id, default.name)
            .with_description(default.description)
            .with_category(default.category)
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: PermissionCategory) -> Self {
        self.category = category;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenantry_rbac::DEFAULT_PERMISSIONS;

    #[test]
    fn test_permission_defaults_to_other() {
        let perm = Permission::new(Uuid::now_v7(), "export_reports");
        assert_eq!(perm.category, PermissionCategory::Other);
        assert!(perm.description.is_none());
    }

    #[test]
    fn test_permission_from_default() {
        let org_id = Uuid::now_v7();
        let perm = Permission::from_default(org_id, &DEFAULT_PERMISSIONS[0]);

        assert_eq!(perm.organization_id, org_id);
        assert_eq!(perm.name, DEFAULT_PERMISSIONS[0].name);
        assert_eq!(perm.category, DEFAULT_PERMISSIONS[0].category);
    }
}

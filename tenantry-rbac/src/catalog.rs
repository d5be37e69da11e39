//! # Catalog
//!
//! The default permission catalog seeded into every organization, and the
//! categories permissions are bucketed into.

use serde::{Deserialize, Serialize};

/// Well-known permission names.
///
/// These are the names checked by the service layer. They are ordinary
/// permission rows inside each organization, so an organization can attach
/// them to any role it defines.
pub mod names {
    /// View the member list of an organization.
    pub const VIEW_MEMBERS: &str = "view_members";
    /// Invite new members and handle join requests.
    pub const INVITE_MEMBERS: &str = "invite_members";
    /// Remove members from an organization.
    pub const REMOVE_MEMBERS: &str = "remove_members";
    /// Create, edit and assign roles and permissions.
    pub const MANAGE_ROLES: &str = "manage_roles";
    /// View organization analytics.
    pub const VIEW_ANALYTICS: &str = "view_analytics";
    /// Edit organization settings.
    pub const MANAGE_SETTINGS: &str = "manage_settings";
    /// View billing information.
    pub const VIEW_BILLING: &str = "view_billing";
    /// Manage billing and subscriptions.
    pub const MANAGE_BILLING: &str = "manage_billing";
}

/// Category a permission is bucketed into.
///
/// Permissions created without an explicit category land in [`Other`].
///
/// [`Other`]: PermissionCategory::Other
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Membership administration
    Members,
    /// Role and permission administration
    Roles,
    /// Reporting
    Analytics,
    /// Organization settings
    Settings,
    /// Billing and subscriptions
    Billing,
    /// Anything else
    Other,
}

impl PermissionCategory {
    /// Get the string representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Roles => "roles",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
            Self::Billing => "billing",
            Self::Other => "other",
        }
    }

    /// Parse a category from its string form (case-insensitive).
    ///
    /// Unknown categories map to `None`; callers that accept free input
    /// usually fall back to [`PermissionCategory::Other`].
    ///
    /// # Example
    ///
    /// ```
    /// use tenantry_rbac::PermissionCategory;
    ///
    /// assert_eq!(PermissionCategory::parse("Billing"), Some(PermissionCategory::Billing));
    /// assert_eq!(PermissionCategory::parse("misc"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "members" => Some(Self::Members),
            "roles" => Some(Self::Roles),
            "analytics" => Some(Self::Analytics),
            "settings" => Some(Self::Settings),
            "billing" => Some(Self::Billing),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// All categories in display order.
    pub fn all() -> &'static [PermissionCategory] {
        &[
            Self::Members,
            Self::Roles,
            Self::Analytics,
            Self::Settings,
            Self::Billing,
            Self::Other,
        ]
    }
}

impl Default for PermissionCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl std::fmt::Display for PermissionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission definition from the default catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultPermission {
    /// Permission name (unique within an organization)
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Category bucket
    pub category: PermissionCategory,
}

/// The catalog seeded into an organization that has no permissions yet.
pub const DEFAULT_PERMISSIONS: [DefaultPermission; 8] = [
    DefaultPermission {
        name: names::VIEW_MEMBERS,
        description: "View organization members",
        category: PermissionCategory::Members,
    },
    DefaultPermission {
        name: names::INVITE_MEMBERS,
        description: "Invite new members",
        category: PermissionCategory::Members,
    },
    DefaultPermission {
        name: names::REMOVE_MEMBERS,
        description: "Remove members from organization",
        category: PermissionCategory::Members,
    },
    DefaultPermission {
        name: names::MANAGE_ROLES,
        description: "Manage roles and permissions",
        category: PermissionCategory::Roles,
    },
    DefaultPermission {
        name: names::VIEW_ANALYTICS,
        description: "View organization analytics",
        category: PermissionCategory::Analytics,
    },
    DefaultPermission {
        name: names::MANAGE_SETTINGS,
        description: "Manage organization settings",
        category: PermissionCategory::Settings,
    },
    DefaultPermission {
        name: names::VIEW_BILLING,
        description: "View billing information",
        category: PermissionCategory::Billing,
    },
    DefaultPermission {
        name: names::MANAGE_BILLING,
        description: "Manage billing and subscriptions",
        category: PermissionCategory::Billing,
    },
];

/// Look up a default permission by name.
pub fn default_permission(name: &str) -> Option<&'static DefaultPermission> {
    DEFAULT_PERMISSIONS.iter().find(|p| p.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_names_are_unique() {
        let names: HashSet<_> = DEFAULT_PERMISSIONS.iter().map(|p| p.name).collect();
        assert_eq!(names.len(), DEFAULT_PERMISSIONS.len());
    }

    #[test]
    fn test_default_catalog_categories() {
        let categories: HashSet<_> = DEFAULT_PERMISSIONS.iter().map(|p| p.category).collect();
        assert!(categories.contains(&PermissionCategory::Members));
        assert!(categories.contains(&PermissionCategory::Roles));
        assert!(categories.contains(&PermissionCategory::Analytics));
        assert!(categories.contains(&PermissionCategory::Settings));
        assert!(categories.contains(&PermissionCategory::Billing));
        assert!(!categories.contains(&PermissionCategory::Other));
    }

    #[test]
    fn test_category_parse_round_trip() {
        for category in PermissionCategory::all() {
            assert_eq!(PermissionCategory::parse(category.as_str()), Some(*category));
        }
        assert_eq!(PermissionCategory::parse(" ROLES "), Some(PermissionCategory::Roles));
        assert_eq!(PermissionCategory::default(), PermissionCategory::Other);
    }

    #[test]
    fn test_default_permission_lookup() {
        let perm = default_permission(names::MANAGE_BILLING).unwrap();
        assert_eq!(perm.category, PermissionCategory::Billing);
        assert!(default_permission("launch_rockets").is_none());
    }
}

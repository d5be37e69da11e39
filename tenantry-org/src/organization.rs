//! Organization domain models
//!
//! Organizations are the tenants of the system. Every role, permission,
//! membership, invitation and join request belongs to exactly one of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An organization represents a tenant in the multi-tenant system.
///
/// Users can belong to multiple organizations with different roles.
/// Organization names are unique across the system (case-insensitive).
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use tenantry_org::Organization;
///
/// let creator = Uuid::now_v7();
/// let org = Organization::new("Acme Corp", creator).with_industry("Manufacturing");
/// assert_eq!(org.name, "Acme Corp");
/// assert_eq!(org.industry.as_deref(), Some("Manufacturing"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name (unique across the system)
    pub name: String,

    /// Industry the organization operates in
    pub industry: Option<String>,

    /// Optional description
    pub description: Option<String>,

    /// The user who provisioned the organization
    pub created_by: Uuid,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Organization {
    /// Creates a new organization.
    ///
    /// The name is trimmed; uniqueness is enforced by the store, not here.
    pub fn new(name: impl Into<String>, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into().trim().to_string(),
            industry: None,
            description: None,
            created_by,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Set the industry.
    pub fn with_industry(mut self, industry: impl Into<String>) -> Self {
        self.industry = Some(industry.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Normalized name used for uniqueness checks.
    pub fn name_key(&self) -> String {
        crate::name_key(&self.name)
    }

    /// Apply a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, update: OrganizationUpdate) -> bool {
        let mut changed = false;
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name != self.name {
                self.name = name;
                changed = true;
            }
        }
        if let Some(industry) = update.industry {
            self.industry = Some(industry);
            changed = true;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
            changed = true;
        }
        if let Some(metadata) = update.metadata {
            self.metadata.extend(metadata);
            changed = true;
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Partial update for an organization. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationUpdate {
    /// New name
    pub name: Option<String>,
    /// New industry
    pub industry: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Metadata entries to merge in
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Summary of an organization as seen by one member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Industry
    pub industry: Option<String>,

    /// Number of members
    pub member_count: usize,

    /// Number of roles defined
    pub role_count: usize,

    /// Invitations still pending and unexpired
    pub pending_invitations: usize,

    /// Join requests awaiting resolution
    pub pending_join_requests: usize,

    /// Names of the caller's roles in this organization
    pub your_roles: Vec<String>,

    /// Whether the caller is an admin here
    pub is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_creation() {
        let creator = Uuid::now_v7();
        let org = Organization::new("  Acme Corp ", creator);

        assert_eq!(org.name, "Acme Corp");
        assert_eq!(org.name_key(), "acme corp");
        assert_eq!(org.created_by, creator);
        assert!(org.industry.is_none());
    }

    #[test]
    fn test_organization_apply_update() {
        let mut org = Organization::new("Acme", Uuid::now_v7());

        let changed = org.apply(OrganizationUpdate {
            name: Some("Acme Holdings".into()),
            description: Some("Widgets".into()),
            ..Default::default()
        });
        assert!(changed);
        assert_eq!(org.name, "Acme Holdings");
        assert_eq!(org.description.as_deref(), Some("Widgets"));

        assert!(!org.apply(OrganizationUpdate::default()));
    }

    #[test]
    fn test_organization_metadata_merge() {
        let mut org = Organization::new("Acme", Uuid::now_v7());
        let mut metadata = HashMap::new();
        metadata.insert("plan".to_string(), serde_json::json!("team"));

        org.apply(OrganizationUpdate {
            metadata: Some(metadata),
            ..Default::default()
        });
        assert_eq!(org.metadata["plan"], serde_json::json!("team"));
    }
}

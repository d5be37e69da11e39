//! Organization provisioning
//!
//! Creating an organization seeds its permission catalog, creates the
//! flagged `Admin` role holding every permission, creates the default
//! member role and makes the creator an admin member. All of it commits in
//! one transaction or not at all.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tenantry_org::{name_key, Membership, Organization, Permission, Role, ADMIN_ROLE_NAME};
use tenantry_rbac::{names, DEFAULT_PERMISSIONS};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz;
use crate::error::{CoreError, CoreResult};
use crate::service::Tenantry;
use crate::store::Tables;

/// Input for [`Tenantry::create_organization`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewOrganization {
    /// Organization name, unique system-wide
    pub name: String,
    /// Industry
    pub industry: Option<String>,
    /// Description
    pub description: Option<String>,
    /// Free-form metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl NewOrganization {
    /// Organization with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
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
}

/// Everything created by provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provisioned {
    /// The new organization
    pub organization: Organization,
    /// The flagged admin role
    pub admin_role: Role,
    /// The default member role, unless its name collides with the admin role
    pub member_role: Option<Role>,
    /// The creator's membership
    pub membership: Membership,
}

/// Seed the default catalog if the organization has no permissions yet.
///
/// Returns the IDs of the permissions created; empty when the organization
/// already had any. Calling it twice never double-seeds.
pub fn ensure_default_permissions(tables: &mut Tables, org_id: Uuid) -> CoreResult<Vec<Uuid>> {
    authz::organization(tables, org_id)?;
    if tables.permissions_in(org_id).next().is_some() {
        return Ok(Vec::new());
    }

    let mut created = Vec::with_capacity(DEFAULT_PERMISSIONS.len());
    for default in DEFAULT_PERMISSIONS.iter() {
        let permission = Permission::from_default(org_id, default);
        created.push(permission.id);
        tables.put_permission(permission)?;
    }
    Ok(created)
}

impl Tenantry {
    /// Create an organization and make the caller its admin.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the name is blank
    /// - `Conflict` if an organization with the same name (ignoring case) exists
    #[instrument(skip(self, new), fields(actor = %actor, name = %new.name))]
    pub async fn create_organization(
        &self,
        actor: Uuid,
        new: NewOrganization,
    ) -> CoreResult<Provisioned> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Invalid("organization name is required".to_string()));
        }
        let member_role_name = self.settings.default_member_role.trim().to_string();

        let provisioned = self
            .store
            .transaction(|t| {
                let creator = authz::actor(t, actor)?;
                if !creator.is_active {
                    return Err(CoreError::Forbidden("user account is inactive".to_string()));
                }
                if t.organization_by_name(&name).is_some() {
                    return Err(CoreError::Conflict(format!(
                        "organization '{}' already exists",
                        name
                    )));
                }

                let mut organization = Organization::new(name.clone(), actor);
                organization.industry = new.industry.clone();
                organization.description = new.description.clone();
                organization.metadata = new.metadata.clone();
                t.put_organization(organization.clone())?;

                ensure_default_permissions(t, organization.id)?;

                let all: Vec<Uuid> = t.permissions_in(organization.id).map(|p| p.id).collect();
                let admin_role = Role::admin(organization.id).with_permissions(all);
                t.put_role(admin_role.clone())?;

                let member_role = if member_role_name.is_empty()
                    || name_key(&member_role_name) == name_key(ADMIN_ROLE_NAME)
                {
                    None
                } else {
                    let view = t
                        .permission_named(organization.id, names::VIEW_MEMBERS)
                        .map(|p| p.id);
                    let role = Role::new(organization.id, member_role_name.clone())
                        .with_description("Default role for new members")
                        .with_permissions(view);
                    t.put_role(role.clone())?;
                    Some(role)
                };

                let membership = Membership::new(organization.id, actor).with_role(admin_role.id);
                t.put_membership(membership.clone())?;

                Ok(Provisioned {
                    organization,
                    admin_role,
                    member_role,
                    membership,
                })
            })
            .await?;

        info!(
            org_id = %provisioned.organization.id,
            admin_role_id = %provisioned.admin_role.id,
            "Organization provisioned"
        );
        Ok(provisioned)
    }
}

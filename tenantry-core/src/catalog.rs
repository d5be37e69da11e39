//! Role and permission catalog
//!
//! Every lookup is scoped to the organization the caller was authorized
//! against: an ID that exists in another organization is reported as not
//! found, exactly like one that does not exist at all.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tenantry_org::{Permission, Role};
use tenantry_rbac::{names, PermissionCategory};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz;
use crate::error::{CoreError, CoreResult};
use crate::provisioning::ensure_default_permissions;
use crate::service::Tenantry;
use crate::store::Tables;

/// Input for [`Tenantry::create_permission`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPermission {
    /// Permission name, unique within the organization
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Category, `other` when absent
    pub category: Option<PermissionCategory>,
}

impl NewPermission {
    /// Permission with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the category.
    pub fn with_category(mut self, category: PermissionCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// Partial update for a permission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New category
    pub category: Option<PermissionCategory>,
}

/// Input for [`Tenantry::create_role`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRole {
    /// Role name, unique within the organization
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Permissions to attach; all must belong to the organization
    #[serde(default)]
    pub permission_ids: Vec<Uuid>,
    /// Grant admin standing to holders
    #[serde(default)]
    pub is_admin: bool,
}

impl NewRole {
    /// Role with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Attach permissions.
    pub fn with_permissions(mut self, ids: impl IntoIterator<Item = Uuid>) -> Self {
        self.permission_ids.extend(ids);
        self
    }

    /// Flag the role as an admin role.
    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }
}

/// Partial update for a role. `permission_ids` replaces the whole set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Replacement permission set
    pub permission_ids: Option<Vec<Uuid>>,
    /// New admin flag
    pub is_admin: Option<bool>,
}

/// A role with its permissions resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDetail {
    /// The role
    pub role: Role,
    /// Permissions granted, sorted by name
    pub permissions: Vec<Permission>,
    /// Members holding the role
    pub member_count: usize,
}

/// Permission in `org_id`, or not found.
pub(crate) fn scoped_permission(tables: &Tables, org_id: Uuid, id: Uuid) -> CoreResult<&Permission> {
    tables
        .permission(id)
        .filter(|p| p.organization_id == org_id)
        .ok_or_else(|| CoreError::not_found("permission", id))
}

/// Role in `org_id`, or not found.
pub(crate) fn scoped_role(tables: &Tables, org_id: Uuid, id: Uuid) -> CoreResult<&Role> {
    tables
        .role(id)
        .filter(|r| r.organization_id == org_id)
        .ok_or_else(|| CoreError::not_found("role", id))
}

fn check_permissions(tables: &Tables, org_id: Uuid, ids: &[Uuid]) -> CoreResult<()> {
    for id in ids {
        scoped_permission(tables, org_id, *id)?;
    }
    Ok(())
}

fn required_name(name: &str, entity: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::Invalid(format!("{} name is required", entity)));
    }
    Ok(name.to_string())
}

fn detail(tables: &Tables, role: &Role) -> RoleDetail {
    let mut permissions: Vec<Permission> = role
        .permission_ids
        .iter()
        .filter_map(|id| tables.permission(*id))
        .cloned()
        .collect();
    permissions.sort_by(|a, b| a.name.cmp(&b.name));
    RoleDetail {
        role: role.clone(),
        permissions,
        member_count: tables
            .memberships_in(role.organization_id)
            .filter(|m| m.has_role(role.id))
            .count(),
    }
}

impl Tenantry {
    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    /// Permissions defined in an organization, sorted by category then name.
    ///
    /// An organization without any permission rows is seeded with the
    /// default catalog first.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id))]
    pub async fn list_permissions(&self, actor: Uuid, org_id: Uuid) -> CoreResult<Vec<Permission>> {
        let needs_seed = self
            .store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                Ok::<_, CoreError>(t.permissions_in(org_id).next().is_none())
            })
            .await?;

        if needs_seed {
            let seeded = self
                .store
                .transaction(|t| ensure_default_permissions(t, org_id))
                .await?;
            if !seeded.is_empty() {
                info!(org_id = %org_id, count = seeded.len(), "Seeded default permissions");
            }
        }

        self.store
            .read(|t| {
                let mut permissions: Vec<Permission> = t.permissions_in(org_id).cloned().collect();
                permissions.sort_by(|a, b| {
                    (a.category.as_str(), &a.name).cmp(&(b.category.as_str(), &b.name))
                });
                Ok(permissions)
            })
            .await
    }

    /// Fetch one permission. Requires membership.
    pub async fn get_permission(
        &self,
        actor: Uuid,
        org_id: Uuid,
        permission_id: Uuid,
    ) -> CoreResult<Permission> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                scoped_permission(t, org_id, permission_id).cloned()
            })
            .await
    }

    /// Define a new permission. Requires `manage_roles`.
    #[instrument(skip(self, new), fields(actor = %actor, org_id = %org_id, name = %new.name))]
    pub async fn create_permission(
        &self,
        actor: Uuid,
        org_id: Uuid,
        new: NewPermission,
    ) -> CoreResult<Permission> {
        let name = required_name(&new.name, "permission")?;
        let permission = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                let mut permission = Permission::new(org_id, name)
                    .with_category(new.category.unwrap_or_default());
                permission.description = new.description;
                t.put_permission(permission.clone())?;
                Ok::<_, CoreError>(permission)
            })
            .await?;

        info!(permission_id = %permission.id, "Permission created");
        Ok(permission)
    }

    /// Edit a permission. Requires `manage_roles`.
    #[instrument(skip(self, update), fields(actor = %actor, org_id = %org_id, permission_id = %permission_id))]
    pub async fn update_permission(
        &self,
        actor: Uuid,
        org_id: Uuid,
        permission_id: Uuid,
        update: PermissionUpdate,
    ) -> CoreResult<Permission> {
        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "permission"))
            .transpose()?;
        self.store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                let mut permission = scoped_permission(t, org_id, permission_id)?.clone();
                if let Some(name) = name {
                    permission.name = name;
                }
                if let Some(description) = update.description {
                    permission.description = Some(description);
                }
                if let Some(category) = update.category {
                    permission.category = category;
                }
                permission.updated_at = Utc::now();
                t.put_permission(permission.clone())?;
                Ok(permission)
            })
            .await
    }

    /// Delete a permission, detaching it from every role. Requires `manage_roles`.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, permission_id = %permission_id))]
    pub async fn delete_permission(
        &self,
        actor: Uuid,
        org_id: Uuid,
        permission_id: Uuid,
    ) -> CoreResult<()> {
        let removed = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                scoped_permission(t, org_id, permission_id)?;
                t.remove_permission(permission_id)
                    .ok_or_else(|| CoreError::not_found("permission", permission_id))
            })
            .await?;

        info!(name = %removed.name, "Permission deleted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Roles defined in an organization, sorted by name. Requires membership.
    pub async fn list_roles(&self, actor: Uuid, org_id: Uuid) -> CoreResult<Vec<RoleDetail>> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                let mut roles: Vec<RoleDetail> =
                    t.roles_in(org_id).map(|r| detail(t, r)).collect();
                roles.sort_by_key(|d| d.role.name_key());
                Ok(roles)
            })
            .await
    }

    /// Fetch one role with its permissions. Requires membership.
    pub async fn get_role(&self, actor: Uuid, org_id: Uuid, role_id: Uuid) -> CoreResult<RoleDetail> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                scoped_role(t, org_id, role_id).map(|r| detail(t, r))
            })
            .await
    }

    /// Define a role. Requires `manage_roles`; an admin-flagged role also
    /// requires the caller to be an admin.
    ///
    /// # Errors
    ///
    /// - `NotFound` if any permission ID is not defined in the organization
    /// - `Conflict` if the name is taken
    #[instrument(skip(self, new), fields(actor = %actor, org_id = %org_id, name = %new.name))]
    pub async fn create_role(&self, actor: Uuid, org_id: Uuid, new: NewRole) -> CoreResult<Role> {
        let name = required_name(&new.name, "role")?;
        let role = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                if new.is_admin {
                    authz::require_admin(t, actor, org_id)?;
                }
                check_permissions(t, org_id, &new.permission_ids)?;

                let mut role = Role::new(org_id, name)
                    .with_admin(new.is_admin)
                    .with_permissions(new.permission_ids.iter().copied());
                role.description = new.description;
                t.put_role(role.clone())?;
                Ok::<_, CoreError>(role)
            })
            .await?;

        info!(role_id = %role.id, is_admin = role.is_admin, "Role created");
        Ok(role)
    }

    /// Edit a role. Requires `manage_roles`; changing the admin flag also
    /// requires the caller to be an admin.
    #[instrument(skip(self, update), fields(actor = %actor, org_id = %org_id, role_id = %role_id))]
    pub async fn update_role(
        &self,
        actor: Uuid,
        org_id: Uuid,
        role_id: Uuid,
        update: RoleUpdate,
    ) -> CoreResult<Role> {
        let name = update
            .name
            .as_deref()
            .map(|n| required_name(n, "role"))
            .transpose()?;
        self.store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                let mut role = scoped_role(t, org_id, role_id)?.clone();
                let had_admin = authz::admin_member_count(t, org_id) > 0;

                if let Some(is_admin) = update.is_admin {
                    if is_admin != role.is_admin {
                        authz::require_admin(t, actor, org_id)?;
                        role.is_admin = is_admin;
                    }
                }
                if let Some(ids) = update.permission_ids.as_deref() {
                    check_permissions(t, org_id, ids)?;
                    role.set_permissions(ids.iter().copied());
                }
                if let Some(name) = name {
                    role.name = name;
                }
                if let Some(description) = update.description {
                    role.description = Some(description);
                }
                role.updated_at = Utc::now();

                t.put_role(role.clone())?;
                authz::ensure_admin_retained(t, org_id, had_admin)?;
                Ok(role)
            })
            .await
    }

    /// Delete a role, detaching it from every membership. Requires `manage_roles`.
    ///
    /// # Errors
    ///
    /// - `Conflict` if a pending invitation targets the role
    /// - `Conflict` if it is the organization's last admin role, or deleting
    ///   it would leave no admin member
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, role_id = %role_id))]
    pub async fn delete_role(&self, actor: Uuid, org_id: Uuid, role_id: Uuid) -> CoreResult<()> {
        let now = Utc::now();
        let removed = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                let role = scoped_role(t, org_id, role_id)?;
                if role.is_admin {
                    authz::require_admin(t, actor, org_id)?;
                    if t.roles_in(org_id).filter(|r| r.is_admin).count() == 1 {
                        return Err(CoreError::Conflict(
                            "cannot delete the last admin role".to_string(),
                        ));
                    }
                }
                if t
                    .invitations_in(org_id)
                    .any(|i| i.role_id == role_id && i.is_active(now))
                {
                    return Err(CoreError::Conflict(format!(
                        "role '{}' is targeted by a pending invitation",
                        role.name
                    )));
                }

                let had_admin = authz::admin_member_count(t, org_id) > 0;
                let removed = t
                    .remove_role(role_id)
                    .ok_or_else(|| CoreError::not_found("role", role_id))?;
                authz::ensure_admin_retained(t, org_id, had_admin)?;
                Ok(removed)
            })
            .await?;

        info!(name = %removed.name, "Role deleted");
        Ok(())
    }
}

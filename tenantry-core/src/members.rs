//! Member management: listing, role assignment and removal.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantry_org::{name_key, Membership, UserStatus};
use tenantry_rbac::names;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::authz;
use crate::catalog::scoped_role;
use crate::error::{CoreError, CoreResult};
use crate::service::Tenantry;
use crate::store::Tables;

/// Role reference shown on a member row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Role ID
    pub id: Uuid,
    /// Role name
    pub name: String,
}

/// One member of an organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberView {
    /// User ID
    pub user_id: Uuid,
    /// Email address
    pub email: String,
    /// Display name
    pub full_name: Option<String>,
    /// Account lifecycle status
    pub status: UserStatus,
    /// Whether the account may sign in
    pub is_active: bool,
    /// Roles held, sorted by name
    pub roles: Vec<RoleRef>,
    /// Whether any held role is admin-flagged
    pub is_admin: bool,
    /// When the membership was created
    pub joined_at: DateTime<Utc>,
}

/// Sort key for [`Tenantry::list_members`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberSort {
    /// Membership creation time
    #[default]
    Joined,
    /// Display name, falling back to email
    Name,
    /// Email address
    Email,
}

/// Filters for [`Tenantry::list_members`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberFilter {
    /// Case-insensitive substring of name or email
    pub search: Option<String>,
    /// Only members holding a role with this name (case-insensitive)
    pub role: Option<String>,
    /// Only members whose account has this status
    pub status: Option<UserStatus>,
    /// Sort key
    #[serde(default)]
    pub sort: MemberSort,
    /// Reverse the sort order
    #[serde(default)]
    pub descending: bool,
}

impl MemberFilter {
    /// Match name or email.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Match a role name.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Match an account status.
    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Sort by a key.
    pub fn sorted_by(mut self, sort: MemberSort, descending: bool) -> Self {
        self.sort = sort;
        self.descending = descending;
        self
    }
}

/// Bulk operation applied to a list of users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "role_ids", rename_all = "snake_case")]
pub enum BulkAction {
    /// Remove the users from the organization
    Remove,
    /// Replace each user's role set
    SetRoles(Vec<Uuid>),
}

/// Result of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOutcome {
    /// Users the action was applied to
    pub updated: Vec<Uuid>,
    /// Users skipped because they are not members
    pub skipped: Vec<Uuid>,
}

fn member_view(tables: &Tables, membership: &Membership) -> Option<MemberView> {
    let user = tables.user(membership.user_id)?;
    let mut roles: Vec<RoleRef> = membership
        .role_ids
        .iter()
        .filter_map(|id| tables.role(*id))
        .map(|r| RoleRef {
            id: r.id,
            name: r.name.clone(),
        })
        .collect();
    roles.sort_by_key(|r| name_key(&r.name));

    Some(MemberView {
        user_id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        status: user.status,
        is_active: user.is_active,
        roles,
        is_admin: authz::holds_admin_role(tables, membership),
        joined_at: membership.joined_at,
    })
}

impl MemberFilter {
    fn matches(&self, member: &MemberView) -> bool {
        if let Some(search) = self.search.as_deref().map(str::to_lowercase) {
            let in_name = member
                .full_name
                .as_deref()
                .is_some_and(|n| n.to_lowercase().contains(&search));
            if !in_name && !member.email.to_lowercase().contains(&search) {
                return false;
            }
        }
        if let Some(role) = self.role.as_deref().map(name_key) {
            if !member.roles.iter().any(|r| name_key(&r.name) == role) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if member.status != status {
                return false;
            }
        }
        true
    }

    fn sort(&self, members: &mut [MemberView]) {
        match self.sort {
            MemberSort::Joined => members.sort_by_key(|m| m.joined_at),
            MemberSort::Email => members.sort_by_key(|m| m.email.to_lowercase()),
            MemberSort::Name => members.sort_by_key(|m| {
                m.full_name
                    .as_deref()
                    .unwrap_or(&m.email)
                    .to_lowercase()
            }),
        }
        if self.descending {
            members.reverse();
        }
    }
}

fn role_set(tables: &Tables, org_id: Uuid, role_ids: &[Uuid]) -> CoreResult<BTreeSet<Uuid>> {
    if role_ids.is_empty() {
        return Err(CoreError::Invalid("at least one role is required".to_string()));
    }
    role_ids
        .iter()
        .map(|id| scoped_role(tables, org_id, *id).map(|r| r.id))
        .collect()
}

impl Tenantry {
    /// Members of an organization. Requires `view_members`.
    pub async fn list_members(
        &self,
        actor: Uuid,
        org_id: Uuid,
        filter: MemberFilter,
    ) -> CoreResult<Vec<MemberView>> {
        self.store
            .read(|t| {
                authz::require_permission(t, actor, org_id, names::VIEW_MEMBERS)?;
                let mut members: Vec<MemberView> = t
                    .memberships_in(org_id)
                    .filter_map(|m| member_view(t, m))
                    .filter(|m| filter.matches(m))
                    .collect();
                filter.sort(&mut members);
                Ok(members)
            })
            .await
    }

    /// Replace a member's roles. Requires `manage_roles`, and admin
    /// standing when granting an admin role or touching an admin.
    ///
    /// # Errors
    ///
    /// - `Invalid` if `role_ids` is empty
    /// - `NotFound` if the user is not a member or a role is foreign
    /// - `Conflict` if the organization would be left without an admin
    #[instrument(skip(self, role_ids), fields(actor = %actor, org_id = %org_id, user_id = %user_id))]
    pub async fn update_member_roles(
        &self,
        actor: Uuid,
        org_id: Uuid,
        user_id: Uuid,
        role_ids: Vec<Uuid>,
    ) -> CoreResult<MemberView> {
        let view = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                let roles = role_set(t, org_id, &role_ids)?;
                let grants_admin = roles
                    .iter()
                    .filter_map(|id| t.role(*id))
                    .any(|r| r.is_admin);

                let mut membership = t
                    .membership(user_id, org_id)
                    .cloned()
                    .ok_or_else(|| CoreError::not_found("member", user_id))?;
                if grants_admin || authz::holds_admin_role(t, &membership) {
                    authz::require_admin(t, actor, org_id)?;
                }
                let had_admin = authz::admin_member_count(t, org_id) > 0;
                membership.set_roles(roles);
                t.put_membership(membership.clone())?;
                authz::ensure_admin_retained(t, org_id, had_admin)?;

                member_view(t, &membership)
                    .ok_or_else(|| CoreError::not_found("user", user_id))
            })
            .await?;

        info!(roles = view.roles.len(), "Member roles updated");
        Ok(view)
    }

    /// Apply one action to many users at once.
    ///
    /// `Remove` requires `remove_members`; `SetRoles` requires
    /// `manage_roles`. Either needs admin standing when a target is an
    /// admin. Non-members are skipped. All-or-nothing: if the
    /// result would leave the organization without an admin, nothing is
    /// applied.
    #[instrument(skip(self, user_ids, action), fields(actor = %actor, org_id = %org_id, count = user_ids.len()))]
    pub async fn bulk_update_members(
        &self,
        actor: Uuid,
        org_id: Uuid,
        user_ids: Vec<Uuid>,
        action: BulkAction,
    ) -> CoreResult<BulkOutcome> {
        let outcome = self
            .store
            .transaction(|t| {
                let roles = match &action {
                    BulkAction::Remove => {
                        authz::require_permission(t, actor, org_id, names::REMOVE_MEMBERS)?;
                        None
                    }
                    BulkAction::SetRoles(role_ids) => {
                        authz::require_permission(t, actor, org_id, names::MANAGE_ROLES)?;
                        let roles = role_set(t, org_id, role_ids)?;
                        if roles.iter().filter_map(|id| t.role(*id)).any(|r| r.is_admin) {
                            authz::require_admin(t, actor, org_id)?;
                        }
                        Some(roles)
                    }
                };

                let unique: BTreeSet<Uuid> = user_ids.iter().copied().collect();
                let touches_admin = unique.iter().any(|id| {
                    t.membership(*id, org_id)
                        .is_some_and(|m| authz::holds_admin_role(t, m))
                });
                if touches_admin {
                    authz::require_admin(t, actor, org_id)?;
                }

                let had_admin = authz::admin_member_count(t, org_id) > 0;
                let mut outcome = BulkOutcome::default();
                for user_id in unique {
                    let Some(mut membership) = t.membership(user_id, org_id).cloned() else {
                        outcome.skipped.push(user_id);
                        continue;
                    };
                    match &roles {
                        None => {
                            t.remove_membership(user_id, org_id);
                        }
                        Some(roles) => {
                            membership.set_roles(roles.iter().copied());
                            t.put_membership(membership)?;
                        }
                    }
                    outcome.updated.push(user_id);
                }
                authz::ensure_admin_retained(t, org_id, had_admin)?;
                Ok::<_, CoreError>(outcome)
            })
            .await?;

        if !outcome.skipped.is_empty() {
            warn!(skipped = outcome.skipped.len(), "Bulk update skipped non-members");
        }
        info!(updated = outcome.updated.len(), "Bulk member update applied");
        Ok(outcome)
    }

    /// Remove a member. Requires `remove_members`; removing an admin
    /// requires admin standing.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, user_id = %user_id))]
    pub async fn remove_member(&self, actor: Uuid, org_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        self.store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::REMOVE_MEMBERS)?;
                let target = t
                    .membership(user_id, org_id)
                    .ok_or_else(|| CoreError::not_found("member", user_id))?;
                if authz::holds_admin_role(t, target) {
                    authz::require_admin(t, actor, org_id)?;
                }
                let had_admin = authz::admin_member_count(t, org_id) > 0;
                t.remove_membership(user_id, org_id)
                    .ok_or_else(|| CoreError::not_found("member", user_id))?;
                authz::ensure_admin_retained(t, org_id, had_admin)
            })
            .await?;

        info!("Member removed");
        Ok(())
    }
}

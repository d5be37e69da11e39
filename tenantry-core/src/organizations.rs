//! Organization reads and settings updates.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tenantry_org::{
    JoinRequestStatus, Organization, OrganizationSummary, OrganizationUpdate,
};
use tenantry_rbac::names;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz;
use crate::error::{CoreError, CoreResult};
use crate::service::Tenantry;
use crate::store::Tables;

/// System-wide totals, visible to superusers only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    /// Registered users
    pub users: usize,
    /// Active users
    pub active_users: usize,
    /// Organizations
    pub organizations: usize,
    /// Roles across all organizations
    pub roles: usize,
    /// Memberships across all organizations
    pub memberships: usize,
    /// Join requests awaiting resolution
    pub pending_join_requests: usize,
}

fn summarize(tables: &Tables, actor: Uuid, org: &Organization) -> OrganizationSummary {
    let now = Utc::now();
    let mut your_roles: Vec<String> = tables
        .membership(actor, org.id)
        .map(|m| {
            m.role_ids
                .iter()
                .filter_map(|id| tables.role(*id))
                .map(|r| r.name.clone())
                .collect()
        })
        .unwrap_or_default();
    your_roles.sort();

    OrganizationSummary {
        id: org.id,
        name: org.name.clone(),
        industry: org.industry.clone(),
        member_count: tables.memberships_in(org.id).count(),
        role_count: tables.roles_in(org.id).count(),
        pending_invitations: tables
            .invitations_in(org.id)
            .filter(|i| i.is_active(now))
            .count(),
        pending_join_requests: tables
            .join_requests_in(org.id)
            .filter(|r| r.status == JoinRequestStatus::Pending)
            .count(),
        your_roles,
        is_admin: authz::is_admin(tables, actor, org.id),
    }
}

impl Tenantry {
    /// Organizations visible to the caller.
    ///
    /// Superusers see every organization; everyone else sees the ones they
    /// belong to. Sorted by name.
    pub async fn list_organizations(&self, actor: Uuid) -> CoreResult<Vec<Organization>> {
        self.store
            .read(|t| {
                let user = authz::actor(t, actor)?;
                let mut orgs: Vec<Organization> = if user.is_superuser {
                    t.organizations().cloned().collect()
                } else {
                    t.memberships_of(actor)
                        .filter_map(|m| t.organization(m.organization_id))
                        .cloned()
                        .collect()
                };
                orgs.sort_by_key(|o| o.name_key());
                Ok(orgs)
            })
            .await
    }

    /// Fetch one organization. Requires membership.
    pub async fn get_organization(&self, actor: Uuid, org_id: Uuid) -> CoreResult<Organization> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                authz::organization(t, org_id).cloned()
            })
            .await
    }

    /// Apply a partial update. Requires `manage_settings`.
    ///
    /// # Errors
    ///
    /// - `Invalid` if the new name is blank
    /// - `Conflict` if the new name is taken by another organization
    #[instrument(skip(self, update), fields(actor = %actor, org_id = %org_id))]
    pub async fn update_organization(
        &self,
        actor: Uuid,
        org_id: Uuid,
        update: OrganizationUpdate,
    ) -> CoreResult<Organization> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CoreError::Invalid("organization name is required".to_string()));
        }

        let org = self
            .store
            .transaction(|t| {
                authz::require_permission(t, actor, org_id, names::MANAGE_SETTINGS)?;
                let mut org = authz::organization(t, org_id)?.clone();
                if let Some(name) = update.name.as_deref() {
                    if t
                        .organization_by_name(name)
                        .is_some_and(|other| other.id != org_id)
                    {
                        return Err(CoreError::Conflict(format!(
                            "organization '{}' already exists",
                            name.trim()
                        )));
                    }
                }
                if org.apply(update) {
                    t.put_organization(org.clone())?;
                }
                Ok(org)
            })
            .await?;

        info!(org_id = %org.id, "Organization updated");
        Ok(org)
    }

    /// Counts and the caller's standing in an organization. Requires membership.
    pub async fn organization_summary(
        &self,
        actor: Uuid,
        org_id: Uuid,
    ) -> CoreResult<OrganizationSummary> {
        self.store
            .read(|t| {
                authz::require_member(t, actor, org_id)?;
                let org = authz::organization(t, org_id)?;
                Ok(summarize(t, actor, org))
            })
            .await
    }

    /// System-wide totals. Superusers only.
    pub async fn platform_stats(&self, actor: Uuid) -> CoreResult<PlatformStats> {
        self.store
            .read(|t| {
                let user = authz::actor(t, actor)?;
                if !user.is_superuser {
                    return Err(CoreError::Forbidden("superuser access required".to_string()));
                }
                Ok(PlatformStats {
                    users: t.users().count(),
                    active_users: t.users().filter(|u| u.is_active).count(),
                    organizations: t.organizations().count(),
                    roles: t.organizations().map(|o| t.roles_in(o.id).count()).sum(),
                    memberships: t
                        .organizations()
                        .map(|o| t.memberships_in(o.id).count())
                        .sum(),
                    pending_join_requests: t
                        .organizations()
                        .flat_map(|o| t.join_requests_in(o.id))
                        .filter(|r| r.is_pending())
                        .count(),
                })
            })
            .await
    }
}

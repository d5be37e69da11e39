//! Join requests
//!
//! A user asks to join; an admin (or a holder of `invite_members`)
//! approves or rejects. Resolution is final: a resolved request is never
//! reopened, and approving twice cannot create a second membership.

use serde::{Deserialize, Serialize};
use tenantry_notify::Notification;
use tenantry_org::{JoinRequest, JoinRequestStatus, Membership};
use tenantry_rbac::names;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::authz;
use crate::catalog::scoped_role;
use crate::error::{CoreError, CoreResult};
use crate::service::{Outcome, Tenantry};
use crate::store::Tables;

/// A join request with the names needed to display it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequestView {
    /// The request
    pub request: JoinRequest,
    /// Target organization name
    pub organization_name: String,
    /// Requester's email
    pub requester_email: String,
    /// Requester's display name
    pub requester_name: String,
}

fn scoped_request(tables: &Tables, org_id: Uuid, id: Uuid) -> CoreResult<&JoinRequest> {
    tables
        .join_request(id)
        .filter(|r| r.organization_id == org_id)
        .ok_or_else(|| CoreError::not_found("join request", id))
}

fn view(tables: &Tables, request: &JoinRequest) -> JoinRequestView {
    let requester = tables.user(request.user_id);
    JoinRequestView {
        request: request.clone(),
        organization_name: tables
            .organization(request.organization_id)
            .map(|o| o.name.clone())
            .unwrap_or_default(),
        requester_email: requester.map(|u| u.email.clone()).unwrap_or_default(),
        requester_name: requester
            .map(|u| u.display_name().to_string())
            .unwrap_or_default(),
    }
}

/// Emails of the active admin members of an organization.
fn admin_emails(tables: &Tables, org_id: Uuid) -> Vec<String> {
    tables
        .memberships_in(org_id)
        .filter(|m| authz::holds_admin_role(tables, m))
        .filter_map(|m| tables.user(m.user_id))
        .filter(|u| u.is_active)
        .map(|u| u.email.clone())
        .collect()
}

fn newest_first(views: &mut [JoinRequestView]) {
    views.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at));
}

impl Tenantry {
    /// Ask to join an organization. Every admin is notified.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the organization does not exist
    /// - `Conflict` if the caller is already a member or has a pending request
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id))]
    pub async fn create_join_request(
        &self,
        actor: Uuid,
        org_id: Uuid,
    ) -> CoreResult<Outcome<JoinRequest>> {
        let (request, recipients, notice) = self
            .store
            .transaction(|t| {
                let user = authz::actor(t, actor)?;
                if !user.is_active {
                    return Err(CoreError::Forbidden("user account is inactive".to_string()));
                }
                let requester_name = user.display_name().to_string();
                let organization = authz::organization(t, org_id)?;
                let organization_name = organization.name.clone();

                if t.membership(actor, org_id).is_some() {
                    return Err(CoreError::Conflict(format!(
                        "already a member of {}",
                        organization_name
                    )));
                }
                if t.join_requests_of(actor)
                    .any(|r| r.organization_id == org_id && r.is_pending())
                {
                    return Err(CoreError::Conflict(format!(
                        "a join request for {} is already pending",
                        organization_name
                    )));
                }

                let request = JoinRequest::new(actor, org_id);
                t.put_join_request(request.clone())?;
                let notice = Notification::JoinRequestReceived {
                    organization_name,
                    requester_name,
                };
                Ok((request, admin_emails(t, org_id), notice))
            })
            .await?;

        info!(request_id = %request.id, admins = recipients.len(), "Join request created");
        let report = self.dispatcher.fan_out(recipients, &notice).await;
        Ok(Outcome::new(request).with_report(report))
    }

    /// Join requests of an organization, newest first, optionally filtered
    /// by status. Requires admin standing or `invite_members`.
    pub async fn list_join_requests(
        &self,
        actor: Uuid,
        org_id: Uuid,
        status: Option<JoinRequestStatus>,
    ) -> CoreResult<Vec<JoinRequestView>> {
        self.store
            .read(|t| {
                authz::require_admin_or(t, actor, org_id, names::INVITE_MEMBERS)?;
                let mut views: Vec<JoinRequestView> = t
                    .join_requests_in(org_id)
                    .filter(|r| status.map_or(true, |s| r.status == s))
                    .map(|r| view(t, r))
                    .collect();
                newest_first(&mut views);
                Ok(views)
            })
            .await
    }

    /// Approve or reject a pending join request.
    ///
    /// Approval grants `role_id` when given, otherwise the organization's
    /// default member role if one exists, otherwise no role. The requester
    /// is notified of the outcome.
    ///
    /// # Errors
    ///
    /// - `Invalid` if `status` is `Pending`
    /// - `NotFound` if the request or role is not in the organization
    /// - `Conflict` if the request is already resolved
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, request_id = %request_id, status = %status))]
    pub async fn resolve_join_request(
        &self,
        actor: Uuid,
        org_id: Uuid,
        request_id: Uuid,
        status: JoinRequestStatus,
        role_id: Option<Uuid>,
    ) -> CoreResult<Outcome<JoinRequest>> {
        if !status.is_terminal() {
            return Err(CoreError::Invalid(format!(
                "cannot resolve a join request to {}",
                status
            )));
        }
        let default_role = self.settings.default_member_role.clone();

        let (request, recipient, notice) = self
            .store
            .transaction(|t| {
                authz::require_admin_or(t, actor, org_id, names::INVITE_MEMBERS)?;
                let mut request = scoped_request(t, org_id, request_id)?.clone();
                if !request.is_pending() {
                    return Err(CoreError::Conflict(format!(
                        "join request already {}",
                        request.status
                    )));
                }

                let granted = if status == JoinRequestStatus::Approved {
                    let granted = match role_id {
                        Some(id) => {
                            let role = scoped_role(t, org_id, id)?;
                            if role.is_admin {
                                authz::require_admin(t, actor, org_id)?;
                            }
                            Some(id)
                        }
                        None => t.role_named(org_id, &default_role).map(|r| r.id),
                    };
                    let membership = match t.membership(request.user_id, org_id).cloned() {
                        Some(mut existing) => {
                            if let Some(id) = granted {
                                existing.add_role(id);
                            }
                            existing
                        }
                        None => Membership::new(org_id, request.user_id)
                            .with_optional_role(granted)
                            .with_inviter(actor),
                    };
                    t.put_membership(membership)?;
                    granted
                } else {
                    None
                };

                request.resolve(status, actor, granted);
                t.put_join_request(request.clone())?;

                let requester = t
                    .user(request.user_id)
                    .map(|u| u.email.clone())
                    .ok_or_else(|| CoreError::not_found("user", request.user_id))?;
                let notice = Notification::JoinRequestResolved {
                    organization_name: authz::organization(t, org_id)?.name.clone(),
                    status: status.as_str().to_string(),
                };
                Ok((request, requester, notice))
            })
            .await?;

        info!(role_id = ?request.role_id, "Join request resolved");
        let report = self.dispatcher.deliver(&recipient, &notice).await;
        Ok(Outcome::new(request).with_report(report))
    }

    /// Delete a join request. Allowed for the requester and for holders of
    /// `invite_members`.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, request_id = %request_id))]
    pub async fn delete_join_request(
        &self,
        actor: Uuid,
        org_id: Uuid,
        request_id: Uuid,
    ) -> CoreResult<()> {
        self.store
            .transaction(|t| {
                authz::actor(t, actor)?;
                let own = t
                    .join_request(request_id)
                    .is_some_and(|r| r.organization_id == org_id && r.user_id == actor);
                if !own {
                    authz::require_admin_or(t, actor, org_id, names::INVITE_MEMBERS)?;
                    scoped_request(t, org_id, request_id)?;
                }
                t.remove_join_request(request_id)
                    .ok_or_else(|| CoreError::not_found("join request", request_id))
            })
            .await?;

        info!("Join request deleted");
        Ok(())
    }

    /// The caller's own join requests across organizations, newest first.
    pub async fn my_join_requests(&self, actor: Uuid) -> CoreResult<Vec<JoinRequestView>> {
        self.store
            .read(|t| {
                authz::actor(t, actor)?;
                let mut views: Vec<JoinRequestView> =
                    t.join_requests_of(actor).map(|r| view(t, r)).collect();
                newest_first(&mut views);
                Ok(views)
            })
            .await
    }
}

//! Invitations
//!
//! ```text
//! pending ──accept──→ accepted
//!    │
//!    └──(expires_at passes)──→ expired
//! ```
//!
//! Expiry is passive: an invitation past `expires_at` reads as expired
//! wherever it is inspected, and is only marked expired in storage when a
//! new invitation for the same address supersedes it. Tokens are stored as
//! SHA-256 digests; the plaintext exists only in the issuing response and
//! the email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tenantry_auth::{generate_temp_password, hash_token, issue_invitation_token};
use tenantry_notify::Notification;
use tenantry_org::{Invitation, InvitationStatus, Membership, User, UserStatus};
use tenantry_rbac::names;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::accounts::normalize_email;
use crate::authz;
use crate::catalog::scoped_role;
use crate::error::{CoreError, CoreResult};
use crate::service::{Outcome, Tenantry};
use crate::store::Tables;

/// Input for [`Tenantry::create_invitation`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewInvitation {
    /// Address to invite
    pub email: String,
    /// Role granted on acceptance
    pub role_id: Uuid,
}

impl NewInvitation {
    /// Invite `email` into `role_id`.
    pub fn new(email: impl Into<String>, role_id: Uuid) -> Self {
        Self {
            email: email.into(),
            role_id,
        }
    }
}

/// An invitation together with its plaintext token.
#[derive(Clone, Serialize, Deserialize)]
pub struct IssuedInvitation {
    /// The stored invitation
    pub invitation: Invitation,
    /// Plaintext token; not recoverable later
    pub token: String,
}

impl std::fmt::Debug for IssuedInvitation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedInvitation")
            .field("invitation", &self.invitation)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Invitation row as listed to admins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationView {
    /// Invitation ID
    pub id: Uuid,
    /// Invited address
    pub email: String,
    /// Target role
    pub role_id: Uuid,
    /// Target role name, if the role still exists
    pub role_name: Option<String>,
    /// Who sent it
    pub invited_by: Uuid,
    /// Status with expiry applied
    pub status: InvitationStatus,
    /// Expiry
    pub expires_at: DateTime<Utc>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Public view of an invitation, looked up by token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationPreview {
    /// Organization ID
    pub organization_id: Uuid,
    /// Organization name
    pub organization_name: String,
    /// Invited address
    pub email: String,
    /// Target role name, if the role still exists
    pub role_name: Option<String>,
    /// Status with expiry applied
    pub status: InvitationStatus,
    /// Expiry
    pub expires_at: DateTime<Utc>,
}

fn scoped_invitation(tables: &Tables, org_id: Uuid, id: Uuid) -> CoreResult<&Invitation> {
    tables
        .invitation(id)
        .filter(|i| i.organization_id == org_id)
        .ok_or_else(|| CoreError::not_found("invitation", id))
}

fn view(tables: &Tables, invitation: &Invitation, now: DateTime<Utc>) -> InvitationView {
    InvitationView {
        id: invitation.id,
        email: invitation.email.clone(),
        role_id: invitation.role_id,
        role_name: tables.role(invitation.role_id).map(|r| r.name.clone()),
        invited_by: invitation.invited_by,
        status: invitation.effective_status(now),
        expires_at: invitation.expires_at,
        created_at: invitation.created_at,
    }
}

/// Names needed to render an invitation email.
fn invitation_notice(
    tables: &Tables,
    invitation: &Invitation,
    token: String,
    temp_password: Option<String>,
) -> Notification {
    Notification::Invitation {
        organization_name: tables
            .organization(invitation.organization_id)
            .map(|o| o.name.clone())
            .unwrap_or_default(),
        inviter_name: tables
            .user(invitation.invited_by)
            .map(|u| u.display_name().to_string())
            .unwrap_or_default(),
        token,
        temp_password,
    }
}

impl Tenantry {
    /// Invite an email address into a role.
    ///
    /// Requires admin standing or `invite_members`; inviting into an
    /// admin-flagged role requires admin standing. When invited-account
    /// provisioning is enabled and no account exists for the address, one
    /// is created with a temporary password that is included in the email.
    ///
    /// # Errors
    ///
    /// - `Invalid` for a malformed email
    /// - `NotFound` if the role is not defined in the organization
    /// - `Conflict` if the address already belongs to a member, or already
    ///   has a pending invitation
    ///
    /// # Returns
    ///
    /// The invitation and its token; email failures are warnings.
    #[instrument(skip(self, new), fields(actor = %actor, org_id = %org_id, email = %new.email))]
    pub async fn create_invitation(
        &self,
        actor: Uuid,
        org_id: Uuid,
        new: NewInvitation,
    ) -> CoreResult<Outcome<IssuedInvitation>> {
        let email = normalize_email(&new.email)?;
        let issued = issue_invitation_token();
        let ttl = self.settings.invitation_ttl()?;

        let account = if self.settings.provision_invited_accounts
            && self.store.read(|t| t.user_by_email(&email).is_none()).await
        {
            let password = generate_temp_password();
            let hash = self.hasher.hash(&password)?;
            Some((User::invited(email.clone(), hash), password))
        } else {
            None
        };

        let (invitation, notice, provisioned) = self
            .store
            .transaction(|t| {
                authz::require_admin_or(t, actor, org_id, names::INVITE_MEMBERS)?;
                let role = scoped_role(t, org_id, new.role_id)?;
                if role.is_admin {
                    authz::require_admin(t, actor, org_id)?;
                }

                if let Some(existing) = t.user_by_email(&email) {
                    if t.membership(existing.id, org_id).is_some() {
                        return Err(CoreError::Conflict(format!(
                            "{} is already a member",
                            email
                        )));
                    }
                }

                let now = Utc::now();
                let key = email.to_lowercase();
                let same_address: Vec<Invitation> = t
                    .invitations_in(org_id)
                    .filter(|i| i.email.to_lowercase() == key)
                    .filter(|i| i.status == InvitationStatus::Pending)
                    .cloned()
                    .collect();
                if same_address.iter().any(|i| i.is_active(now)) {
                    return Err(CoreError::Conflict(format!(
                        "{} already has a pending invitation",
                        email
                    )));
                }
                for mut stale in same_address {
                    if t.role(stale.role_id).is_some() {
                        stale.expire();
                        t.put_invitation(stale)?;
                    } else {
                        t.remove_invitation(stale.id);
                    }
                }

                let mut temp_password = None;
                let mut provisioned = None;
                if let Some((user, password)) = account {
                    if t.user_by_email(&email).is_none() {
                        provisioned = Some(user.id);
                        t.put_user(user)?;
                        temp_password = Some(password);
                    }
                }

                let invitation = Invitation::new(
                    org_id,
                    email.clone(),
                    new.role_id,
                    actor,
                    issued.digest.clone(),
                    ttl,
                );
                t.put_invitation(invitation.clone())?;
                let notice =
                    invitation_notice(t, &invitation, issued.plaintext.clone(), temp_password);
                Ok((invitation, notice, provisioned))
            })
            .await?;

        if let Some(user_id) = provisioned {
            info!(user_id = %user_id, "Provisioned invited account");
        }
        info!(invitation_id = %invitation.id, "Invitation created");

        let report = self.dispatcher.deliver(&invitation.email, &notice).await;
        if !report.is_clean() {
            warn!(invitation_id = %invitation.id, "Invitation stored but email not delivered");
        }

        Ok(Outcome::new(IssuedInvitation {
            invitation,
            token: issued.plaintext,
        })
        .with_report(report))
    }

    /// Redeem an invitation token as the signed-in user.
    ///
    /// The caller's email must match the invited address exactly. If the
    /// caller is already a member, the invitation role is added to their
    /// existing roles. An `invited` account becomes `active`.
    ///
    /// # Errors
    ///
    /// - `Invalid` for an unknown or already accepted token
    /// - `Expired` past the invitation's expiry
    /// - `Forbidden` if the caller's email differs from the invited address
    #[instrument(skip(self, token), fields(actor = %actor))]
    pub async fn accept_invitation(&self, actor: Uuid, token: &str) -> CoreResult<Membership> {
        let digest = hash_token(token.trim());
        let now = Utc::now();

        let (membership, invitation_id) = self
            .store
            .transaction(|t| {
                let user = authz::actor(t, actor)?.clone();
                let mut invitation = t
                    .invitation_by_token_hash(&digest)
                    .cloned()
                    .ok_or_else(|| CoreError::Invalid("invalid invitation token".to_string()))?;

                match invitation.effective_status(now) {
                    InvitationStatus::Pending => {}
                    InvitationStatus::Accepted => {
                        return Err(CoreError::Invalid(
                            "invitation has already been accepted".to_string(),
                        ))
                    }
                    InvitationStatus::Expired => {
                        return Err(CoreError::Expired("invitation has expired".to_string()))
                    }
                }
                if invitation.email != user.email {
                    return Err(CoreError::Forbidden(
                        "invitation was issued to a different email address".to_string(),
                    ));
                }

                let membership = match t.membership(actor, invitation.organization_id).cloned() {
                    Some(mut existing) => {
                        existing.add_role(invitation.role_id);
                        existing
                    }
                    None => Membership::new(invitation.organization_id, actor)
                        .with_role(invitation.role_id)
                        .with_inviter(invitation.invited_by),
                };
                t.put_membership(membership.clone())?;

                invitation.accept();
                let invitation_id = invitation.id;
                t.put_invitation(invitation)?;

                if user.status == UserStatus::Invited {
                    let mut user = user;
                    user.activate();
                    t.put_user(user)?;
                }
                Ok((membership, invitation_id))
            })
            .await?;

        info!(
            invitation_id = %invitation_id,
            org_id = %membership.organization_id,
            "Invitation accepted"
        );
        Ok(membership)
    }

    /// Issue a fresh token and expiry for an invitation and email it again.
    /// Admins only.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the invitation was already accepted, the address
    ///   is already a member, or another invitation for the address is
    ///   still pending
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, invitation_id = %invitation_id))]
    pub async fn resend_invitation(
        &self,
        actor: Uuid,
        org_id: Uuid,
        invitation_id: Uuid,
    ) -> CoreResult<Outcome<IssuedInvitation>> {
        let issued = issue_invitation_token();
        let ttl = self.settings.invitation_ttl()?;

        let (invitation, notice) = self
            .store
            .transaction(|t| {
                authz::require_admin(t, actor, org_id)?;
                let mut invitation = scoped_invitation(t, org_id, invitation_id)?.clone();
                if invitation.status == InvitationStatus::Accepted {
                    return Err(CoreError::Conflict(
                        "invitation has already been accepted".to_string(),
                    ));
                }
                if let Some(existing) = t.user_by_email(&invitation.email) {
                    if t.membership(existing.id, org_id).is_some() {
                        return Err(CoreError::Conflict(format!(
                            "{} is already a member",
                            invitation.email
                        )));
                    }
                }
                let now = Utc::now();
                let key = invitation.email.to_lowercase();
                let superseded = t
                    .invitations_in(org_id)
                    .filter(|i| i.id != invitation.id)
                    .any(|i| i.email.to_lowercase() == key && i.is_active(now));
                if superseded {
                    return Err(CoreError::Conflict(format!(
                        "{} already has a newer pending invitation",
                        invitation.email
                    )));
                }
                invitation.reissue(issued.digest.clone(), ttl);
                t.put_invitation(invitation.clone())?;
                let notice = invitation_notice(t, &invitation, issued.plaintext.clone(), None);
                Ok((invitation, notice))
            })
            .await?;

        info!("Invitation reissued");
        let report = self.dispatcher.deliver(&invitation.email, &notice).await;
        Ok(Outcome::new(IssuedInvitation {
            invitation,
            token: issued.plaintext,
        })
        .with_report(report))
    }

    /// Retarget a pending invitation at another role. Admins only.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, invitation_id = %invitation_id))]
    pub async fn update_invitation_role(
        &self,
        actor: Uuid,
        org_id: Uuid,
        invitation_id: Uuid,
        role_id: Uuid,
    ) -> CoreResult<InvitationView> {
        let now = Utc::now();
        self.store
            .transaction(|t| {
                authz::require_admin(t, actor, org_id)?;
                scoped_role(t, org_id, role_id)?;
                let mut invitation = scoped_invitation(t, org_id, invitation_id)?.clone();
                if invitation.status == InvitationStatus::Accepted {
                    return Err(CoreError::Conflict(
                        "invitation has already been accepted".to_string(),
                    ));
                }
                invitation.role_id = role_id;
                invitation.updated_at = now;
                t.put_invitation(invitation.clone())?;
                Ok(view(t, &invitation, now))
            })
            .await
    }

    /// Delete an invitation. Admins only.
    #[instrument(skip(self), fields(actor = %actor, org_id = %org_id, invitation_id = %invitation_id))]
    pub async fn cancel_invitation(
        &self,
        actor: Uuid,
        org_id: Uuid,
        invitation_id: Uuid,
    ) -> CoreResult<()> {
        self.store
            .transaction(|t| {
                authz::require_admin(t, actor, org_id)?;
                scoped_invitation(t, org_id, invitation_id)?;
                t.remove_invitation(invitation_id)
                    .ok_or_else(|| CoreError::not_found("invitation", invitation_id))
            })
            .await?;

        info!("Invitation cancelled");
        Ok(())
    }

    /// Invitations of an organization, newest first. Admins only.
    pub async fn list_invitations(
        &self,
        actor: Uuid,
        org_id: Uuid,
    ) -> CoreResult<Vec<InvitationView>> {
        let now = Utc::now();
        self.store
            .read(|t| {
                authz::require_admin(t, actor, org_id)?;
                let mut views: Vec<InvitationView> =
                    t.invitations_in(org_id).map(|i| view(t, i, now)).collect();
                views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(views)
            })
            .await
    }

    /// Look up an invitation by token without signing in.
    ///
    /// # Errors
    ///
    /// - `Invalid` for an unknown token
    pub async fn invitation_preview(&self, token: &str) -> CoreResult<InvitationPreview> {
        let digest = hash_token(token.trim());
        let now = Utc::now();
        self.store
            .read(|t| {
                let invitation = t
                    .invitation_by_token_hash(&digest)
                    .ok_or_else(|| CoreError::Invalid("invalid invitation token".to_string()))?;
                let organization = authz::organization(t, invitation.organization_id)?;
                Ok(InvitationPreview {
                    organization_id: organization.id,
                    organization_name: organization.name.clone(),
                    email: invitation.email.clone(),
                    role_name: t.role(invitation.role_id).map(|r| r.name.clone()),
                    status: invitation.effective_status(now),
                    expires_at: invitation.expires_at,
                })
            })
            .await
    }
}

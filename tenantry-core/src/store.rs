//! Entity store
//!
//! All entities live in flat tables keyed by UUID and reference each other
//! by ID only. [`Tables`] enforces the unique and referential constraints on
//! every write; [`EntityStore`] wraps the tables behind an async lock and
//! provides all-or-nothing transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use tenantry_org::{
    name_key, Invitation, JoinRequest, Membership, Organization, Permission, Role, User,
};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Store constraint violations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint would be broken
    #[error("{entity} already exists: {key}")]
    UniqueViolation {
        /// Entity type
        entity: &'static str,
        /// Conflicting key
        key: String,
    },

    /// A referenced entity does not exist (or lives in another organization)
    #[error("{entity} {id} does not exist")]
    Dangling {
        /// Referenced entity type
        entity: &'static str,
        /// Referenced ID
        id: Uuid,
    },
}

/// Result type for store writes.
pub type StoreResult<T> = Result<T, StoreError>;

/// The tables behind the store.
///
/// Iteration follows key order; UUID v7 keys make that creation order.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    users: BTreeMap<Uuid, User>,
    organizations: BTreeMap<Uuid, Organization>,
    roles: BTreeMap<Uuid, Role>,
    permissions: BTreeMap<Uuid, Permission>,
    memberships: BTreeMap<Uuid, Membership>,
    invitations: BTreeMap<Uuid, Invitation>,
    join_requests: BTreeMap<Uuid, JoinRequest>,
}

impl Tables {
    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Look up a user.
    pub fn user(&self, id: Uuid) -> Option<&User> {
        self.users.get(&id)
    }

    /// Look up a user by email, ignoring case.
    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        let key = name_key(email);
        self.users.values().find(|u| u.email_key() == key)
    }

    /// All users.
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.users.values()
    }

    /// Insert or replace a user. Emails are unique, ignoring case.
    pub fn put_user(&mut self, user: User) -> StoreResult<()> {
        let key = user.email_key();
        if self
            .users
            .values()
            .any(|u| u.id != user.id && u.email_key() == key)
        {
            return Err(StoreError::UniqueViolation {
                entity: "user",
                key: user.email,
            });
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Organizations
    // ------------------------------------------------------------------

    /// Look up an organization.
    pub fn organization(&self, id: Uuid) -> Option<&Organization> {
        self.organizations.get(&id)
    }

    /// Look up an organization by name, ignoring case and surrounding space.
    pub fn organization_by_name(&self, name: &str) -> Option<&Organization> {
        let key = name_key(name);
        self.organizations.values().find(|o| o.name_key() == key)
    }

    /// All organizations.
    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    /// Insert or replace an organization. Names are unique system-wide.
    pub fn put_organization(&mut self, org: Organization) -> StoreResult<()> {
        let key = org.name_key();
        if self
            .organizations
            .values()
            .any(|o| o.id != org.id && o.name_key() == key)
        {
            return Err(StoreError::UniqueViolation {
                entity: "organization",
                key: org.name,
            });
        }
        self.organizations.insert(org.id, org);
        Ok(())
    }

    fn require_organization(&self, id: Uuid) -> StoreResult<()> {
        if self.organizations.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Dangling {
                entity: "organization",
                id,
            })
        }
    }

    // ------------------------------------------------------------------
    // Permissions
    // ------------------------------------------------------------------

    /// Look up a permission.
    pub fn permission(&self, id: Uuid) -> Option<&Permission> {
        self.permissions.get(&id)
    }

    /// Permissions defined in an organization.
    pub fn permissions_in(&self, org_id: Uuid) -> impl Iterator<Item = &Permission> {
        self.permissions
            .values()
            .filter(move |p| p.organization_id == org_id)
    }

    /// Look up a permission by name within an organization.
    pub fn permission_named(&self, org_id: Uuid, name: &str) -> Option<&Permission> {
        let key = name_key(name);
        self.permissions_in(org_id).find(|p| name_key(&p.name) == key)
    }

    /// Insert or replace a permission. Names are unique per organization.
    pub fn put_permission(&mut self, permission: Permission) -> StoreResult<()> {
        self.require_organization(permission.organization_id)?;
        let key = name_key(&permission.name);
        if self
            .permissions_in(permission.organization_id)
            .any(|p| p.id != permission.id && name_key(&p.name) == key)
        {
            return Err(StoreError::UniqueViolation {
                entity: "permission",
                key: permission.name,
            });
        }
        self.permissions.insert(permission.id, permission);
        Ok(())
    }

    /// Delete a permission and detach it from every role.
    pub fn remove_permission(&mut self, id: Uuid) -> Option<Permission> {
        let removed = self.permissions.remove(&id)?;
        for role in self
            .roles
            .values_mut()
            .filter(|r| r.organization_id == removed.organization_id)
        {
            role.revoke(id);
        }
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Roles
    // ------------------------------------------------------------------

    /// Look up a role.
    pub fn role(&self, id: Uuid) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Roles defined in an organization.
    pub fn roles_in(&self, org_id: Uuid) -> impl Iterator<Item = &Role> {
        self.roles
            .values()
            .filter(move |r| r.organization_id == org_id)
    }

    /// Look up a role by name within an organization, ignoring case.
    pub fn role_named(&self, org_id: Uuid, name: &str) -> Option<&Role> {
        let key = name_key(name);
        self.roles_in(org_id).find(|r| r.name_key() == key)
    }

    /// Insert or replace a role.
    ///
    /// Every permission must belong to the role's organization, and role
    /// names are unique per organization.
    pub fn put_role(&mut self, role: Role) -> StoreResult<()> {
        self.require_organization(role.organization_id)?;
        for &permission_id in &role.permission_ids {
            match self.permissions.get(&permission_id) {
                Some(p) if p.organization_id == role.organization_id => {}
                _ => {
                    return Err(StoreError::Dangling {
                        entity: "permission",
                        id: permission_id,
                    })
                }
            }
        }
        let key = role.name_key();
        if self
            .roles_in(role.organization_id)
            .any(|r| r.id != role.id && r.name_key() == key)
        {
            return Err(StoreError::UniqueViolation {
                entity: "role",
                key: role.name,
            });
        }
        self.roles.insert(role.id, role);
        Ok(())
    }

    /// Delete a role and detach it from every membership.
    pub fn remove_role(&mut self, id: Uuid) -> Option<Role> {
        let removed = self.roles.remove(&id)?;
        for membership in self
            .memberships
            .values_mut()
            .filter(|m| m.organization_id == removed.organization_id)
        {
            membership.remove_role(id);
        }
        Some(removed)
    }

    // ------------------------------------------------------------------
    // Memberships
    // ------------------------------------------------------------------

    /// The membership of a user in an organization.
    pub fn membership(&self, user_id: Uuid, org_id: Uuid) -> Option<&Membership> {
        self.memberships
            .values()
            .find(|m| m.user_id == user_id && m.organization_id == org_id)
    }

    /// Memberships of an organization.
    pub fn memberships_in(&self, org_id: Uuid) -> impl Iterator<Item = &Membership> {
        self.memberships
            .values()
            .filter(move |m| m.organization_id == org_id)
    }

    /// Memberships held by a user.
    pub fn memberships_of(&self, user_id: Uuid) -> impl Iterator<Item = &Membership> {
        self.memberships
            .values()
            .filter(move |m| m.user_id == user_id)
    }

    /// Insert or replace a membership.
    ///
    /// At most one membership exists per (user, organization), and every
    /// role must belong to that organization.
    pub fn put_membership(&mut self, membership: Membership) -> StoreResult<()> {
        self.require_organization(membership.organization_id)?;
        if !self.users.contains_key(&membership.user_id) {
            return Err(StoreError::Dangling {
                entity: "user",
                id: membership.user_id,
            });
        }
        for &role_id in &membership.role_ids {
            match self.roles.get(&role_id) {
                Some(r) if r.organization_id == membership.organization_id => {}
                _ => {
                    return Err(StoreError::Dangling {
                        entity: "role",
                        id: role_id,
                    })
                }
            }
        }
        if self.memberships.values().any(|m| {
            m.id != membership.id
                && m.user_id == membership.user_id
                && m.organization_id == membership.organization_id
        }) {
            return Err(StoreError::UniqueViolation {
                entity: "membership",
                key: format!("{}/{}", membership.user_id, membership.organization_id),
            });
        }
        self.memberships.insert(membership.id, membership);
        Ok(())
    }

    /// Delete the membership of a user in an organization.
    pub fn remove_membership(&mut self, user_id: Uuid, org_id: Uuid) -> Option<Membership> {
        let id = self.membership(user_id, org_id)?.id;
        self.memberships.remove(&id)
    }

    // ------------------------------------------------------------------
    // Invitations
    // ------------------------------------------------------------------

    /// Look up an invitation.
    pub fn invitation(&self, id: Uuid) -> Option<&Invitation> {
        self.invitations.get(&id)
    }

    /// Look up an invitation by token digest.
    pub fn invitation_by_token_hash(&self, token_hash: &str) -> Option<&Invitation> {
        self.invitations
            .values()
            .find(|i| i.token_hash == token_hash)
    }

    /// Invitations of an organization.
    pub fn invitations_in(&self, org_id: Uuid) -> impl Iterator<Item = &Invitation> {
        self.invitations
            .values()
            .filter(move |i| i.organization_id == org_id)
    }

    /// Insert or replace an invitation. Token digests are unique.
    pub fn put_invitation(&mut self, invitation: Invitation) -> StoreResult<()> {
        self.require_organization(invitation.organization_id)?;
        match self.roles.get(&invitation.role_id) {
            Some(r) if r.organization_id == invitation.organization_id => {}
            _ => {
                return Err(StoreError::Dangling {
                    entity: "role",
                    id: invitation.role_id,
                })
            }
        }
        if self
            .invitations
            .values()
            .any(|i| i.id != invitation.id && i.token_hash == invitation.token_hash)
        {
            return Err(StoreError::UniqueViolation {
                entity: "invitation",
                key: "token".to_string(),
            });
        }
        self.invitations.insert(invitation.id, invitation);
        Ok(())
    }

    /// Delete an invitation.
    pub fn remove_invitation(&mut self, id: Uuid) -> Option<Invitation> {
        self.invitations.remove(&id)
    }

    // ------------------------------------------------------------------
    // Join requests
    // ------------------------------------------------------------------

    /// Look up a join request.
    pub fn join_request(&self, id: Uuid) -> Option<&JoinRequest> {
        self.join_requests.get(&id)
    }

    /// Join requests targeting an organization.
    pub fn join_requests_in(&self, org_id: Uuid) -> impl Iterator<Item = &JoinRequest> {
        self.join_requests
            .values()
            .filter(move |r| r.organization_id == org_id)
    }

    /// Join requests made by a user.
    pub fn join_requests_of(&self, user_id: Uuid) -> impl Iterator<Item = &JoinRequest> {
        self.join_requests
            .values()
            .filter(move |r| r.user_id == user_id)
    }

    /// Insert or replace a join request.
    ///
    /// A user holds at most one pending request per organization.
    pub fn put_join_request(&mut self, request: JoinRequest) -> StoreResult<()> {
        self.require_organization(request.organization_id)?;
        if !self.users.contains_key(&request.user_id) {
            return Err(StoreError::Dangling {
                entity: "user",
                id: request.user_id,
            });
        }
        if request.is_pending()
            && self.join_requests.values().any(|r| {
                r.id != request.id
                    && r.is_pending()
                    && r.user_id == request.user_id
                    && r.organization_id == request.organization_id
            })
        {
            return Err(StoreError::UniqueViolation {
                entity: "join request",
                key: format!("{}/{}", request.user_id, request.organization_id),
            });
        }
        self.join_requests.insert(request.id, request);
        Ok(())
    }

    /// Delete a join request.
    pub fn remove_join_request(&mut self, id: Uuid) -> Option<JoinRequest> {
        self.join_requests.remove(&id)
    }
}

/// Shared, transactional handle to the tables.
///
/// Cloning the store clones the handle, not the data.
#[derive(Clone, Default)]
pub struct EntityStore {
    tables: Arc<RwLock<Tables>>,
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore").finish_non_exhaustive()
    }
}

impl EntityStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only closure against a consistent view of the tables.
    pub async fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let tables = self.tables.read().await;
        f(&tables)
    }

    /// Run a mutation atomically.
    ///
    /// The closure works on a copy of the tables; the copy replaces the
    /// live tables only if the closure returns `Ok`. Writers are serialized
    /// for the whole duration of the closure.
    pub async fn transaction<T, E>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, E>,
    ) -> Result<T, E> {
        let mut tables = self.tables.write().await;
        let mut working = tables.clone();
        let value = f(&mut working)?;
        *tables = working;
        Ok(value)
    }

    /// Copy of the current tables.
    pub async fn snapshot(&self) -> Tables {
        self.tables.read().await.clone()
    }
}

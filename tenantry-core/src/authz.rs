//! Authorization resolver
//!
//! Pure functions over [`Tables`]. A user's permissions in an organization
//! are the union of the permissions of every role on their membership.
//! Superusers are allowed everything; admin standing comes from holding a
//! role flagged `is_admin`.

use crate::error::{CoreError, CoreResult};
use crate::store::Tables;
use tenantry_org::{Membership, Organization, User};
use tenantry_rbac::{Decision, DenyReason, PermissionSet};
use uuid::Uuid;

/// Union of permission names granted by a membership's roles.
pub fn membership_permissions(tables: &Tables, membership: &Membership) -> PermissionSet {
    membership
        .role_ids
        .iter()
        .filter_map(|id| tables.role(*id))
        .flat_map(|role| role.permission_ids.iter())
        .filter_map(|id| tables.permission(*id))
        .map(|p| p.name.clone())
        .collect()
}

/// Permission names a user holds in an organization.
///
/// Empty for non-members. Superusers get the organization's full catalog.
pub fn effective_permissions(tables: &Tables, user_id: Uuid, org_id: Uuid) -> PermissionSet {
    if tables.user(user_id).is_some_and(|u| u.is_superuser) {
        return tables
            .permissions_in(org_id)
            .map(|p| p.name.clone())
            .collect();
    }
    tables
        .membership(user_id, org_id)
        .map(|m| membership_permissions(tables, m))
        .unwrap_or_default()
}

/// Decide whether `user_id` may exercise `permission` in `org_id`.
pub fn decide(tables: &Tables, user_id: Uuid, org_id: Uuid, permission: &str) -> Decision {
    let Some(user) = tables.user(user_id) else {
        return Decision::deny(DenyReason::NotAMember);
    };
    if user.is_superuser {
        return Decision::allow();
    }
    if !user.is_active {
        return Decision::deny(DenyReason::Inactive);
    }
    match tables.membership(user_id, org_id) {
        None => Decision::deny(DenyReason::NotAMember),
        Some(membership) => membership_permissions(tables, membership).decide(permission),
    }
}

/// Whether a membership carries an admin-flagged role.
pub fn holds_admin_role(tables: &Tables, membership: &Membership) -> bool {
    membership
        .role_ids
        .iter()
        .filter_map(|id| tables.role(*id))
        .any(|r| r.is_admin)
}

/// Whether the user is a superuser or holds an admin-flagged role in the organization.
pub fn is_admin(tables: &Tables, user_id: Uuid, org_id: Uuid) -> bool {
    match tables.user(user_id) {
        Some(user) if user.is_superuser => true,
        Some(user) if user.is_active => tables
            .membership(user_id, org_id)
            .is_some_and(|m| holds_admin_role(tables, m)),
        _ => false,
    }
}

/// Number of members holding an admin-flagged role.
pub fn admin_member_count(tables: &Tables, org_id: Uuid) -> usize {
    tables
        .memberships_in(org_id)
        .filter(|m| holds_admin_role(tables, m))
        .count()
}

/// Refuse a mutation that removed the last admin member of an organization.
///
/// `had_admin` is the state before the mutation.
pub fn ensure_admin_retained(tables: &Tables, org_id: Uuid, had_admin: bool) -> CoreResult<()> {
    if had_admin && admin_member_count(tables, org_id) == 0 {
        return Err(CoreError::Conflict(
            "organization must keep at least one admin member".to_string(),
        ));
    }
    Ok(())
}

/// Resolve the acting user. Unknown users are unauthenticated.
pub fn actor(tables: &Tables, user_id: Uuid) -> CoreResult<&User> {
    tables
        .user(user_id)
        .ok_or_else(|| CoreError::Unauthenticated(format!("unknown user {}", user_id)))
}

/// Resolve an organization. Missing organizations are not found.
pub fn organization(tables: &Tables, org_id: Uuid) -> CoreResult<&Organization> {
    tables
        .organization(org_id)
        .ok_or_else(|| CoreError::not_found("organization", org_id))
}

/// Require membership (or superuser).
pub fn require_member(tables: &Tables, user_id: Uuid, org_id: Uuid) -> CoreResult<()> {
    organization(tables, org_id)?;
    let user = actor(tables, user_id)?;
    if user.is_superuser {
        return Ok(());
    }
    if !user.is_active {
        return Err(DenyReason::Inactive.into());
    }
    if tables.membership(user_id, org_id).is_none() {
        return Err(DenyReason::NotAMember.into());
    }
    Ok(())
}

/// Require a named permission.
pub fn require_permission(
    tables: &Tables,
    user_id: Uuid,
    org_id: Uuid,
    permission: &str,
) -> CoreResult<()> {
    organization(tables, org_id)?;
    actor(tables, user_id)?;
    match decide(tables, user_id, org_id, permission) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(reason.into()),
    }
}

/// Require admin standing.
pub fn require_admin(tables: &Tables, user_id: Uuid, org_id: Uuid) -> CoreResult<()> {
    require_member(tables, user_id, org_id)?;
    if is_admin(tables, user_id, org_id) {
        Ok(())
    } else {
        Err(DenyReason::NotAnAdmin.into())
    }
}

/// Require admin standing or a named permission.
pub fn require_admin_or(
    tables: &Tables,
    user_id: Uuid,
    org_id: Uuid,
    permission: &str,
) -> CoreResult<()> {
    require_member(tables, user_id, org_id)?;
    if is_admin(tables, user_id, org_id) {
        return Ok(());
    }
    require_permission(tables, user_id, org_id, permission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tenantry_org::{Permission, Role};
    use tenantry_rbac::names;

    struct Fixture {
        tables: Tables,
        org: Uuid,
        admin: Uuid,
        viewer: Uuid,
        outsider: Uuid,
        root: Uuid,
    }

    fn fixture() -> Fixture {
        let mut t = Tables::default();
        let admin = User::new("admin@x.test", "h", None);
        let viewer = User::new("viewer@x.test", "h", None);
        let outsider = User::new("out@x.test", "h", None);
        let root = User::new("root@x.test", "h", None).with_superuser();
        for u in [&admin, &viewer, &outsider, &root] {
            t.put_user(u.clone()).unwrap();
        }

        let org = Organization::new("Acme", admin.id);
        t.put_organization(org.clone()).unwrap();

        let view = Permission::new(org.id, names::VIEW_MEMBERS);
        let invite = Permission::new(org.id, names::INVITE_MEMBERS);
        t.put_permission(view.clone()).unwrap();
        t.put_permission(invite.clone()).unwrap();

        let admin_role = Role::admin(org.id).with_permissions([view.id, invite.id]);
        let viewer_role = Role::new(org.id, "Viewer").with_permissions([view.id]);
        t.put_role(admin_role.clone()).unwrap();
        t.put_role(viewer_role.clone()).unwrap();

        t.put_membership(Membership::new(org.id, admin.id).with_role(admin_role.id))
            .unwrap();
        t.put_membership(Membership::new(org.id, viewer.id).with_role(viewer_role.id))
            .unwrap();

        Fixture {
            tables: t,
            org: org.id,
            admin: admin.id,
            viewer: viewer.id,
            outsider: outsider.id,
            root: root.id,
        }
    }

    #[test]
    fn test_superuser_always_allowed() {
        let f = fixture();
        assert!(decide(&f.tables, f.root, f.org, "anything_at_all").is_allowed());
        assert!(decide(&f.tables, f.root, Uuid::now_v7(), names::MANAGE_BILLING).is_allowed());
        assert!(is_admin(&f.tables, f.root, f.org));
    }

    #[test]
    fn test_non_member_denied() {
        let f = fixture();
        let decision = decide(&f.tables, f.outsider, f.org, names::VIEW_MEMBERS);
        assert_eq!(decision.reason(), Some(&DenyReason::NotAMember));
    }

    #[test]
    fn test_permission_union() {
        let f = fixture();
        assert!(decide(&f.tables, f.viewer, f.org, names::VIEW_MEMBERS).is_allowed());
        assert_eq!(
            decide(&f.tables, f.viewer, f.org, names::INVITE_MEMBERS).reason(),
            Some(&DenyReason::MissingPermission(names::INVITE_MEMBERS.to_string()))
        );
        assert!(decide(&f.tables, f.admin, f.org, names::INVITE_MEMBERS).is_allowed());
    }

    #[test]
    fn test_multiple_roles_union() {
        let mut f = fixture();
        let billing = Permission::new(f.org, names::VIEW_BILLING);
        f.tables.put_permission(billing.clone()).unwrap();
        let finance = Role::new(f.org, "Finance").with_permissions([billing.id]);
        f.tables.put_role(finance.clone()).unwrap();

        let mut membership = f.tables.membership(f.viewer, f.org).unwrap().clone();
        membership.add_role(finance.id);
        f.tables.put_membership(membership).unwrap();

        let perms = effective_permissions(&f.tables, f.viewer, f.org);
        assert!(perms.has(names::VIEW_MEMBERS));
        assert!(perms.has(names::VIEW_BILLING));
        assert!(!perms.has(names::INVITE_MEMBERS));
    }

    #[test]
    fn test_admin_detection_uses_flag_not_name() {
        let mut f = fixture();
        // A role merely named like an admin grants nothing special.
        let fake = Role::new(f.org, "Administrators Fan Club");
        f.tables.put_role(fake.clone()).unwrap();
        let mut membership = f.tables.membership(f.viewer, f.org).unwrap().clone();
        membership.add_role(fake.id);
        f.tables.put_membership(membership).unwrap();

        assert!(!is_admin(&f.tables, f.viewer, f.org));
        assert!(is_admin(&f.tables, f.admin, f.org));
    }

    #[test]
    fn test_inactive_user_denied() {
        let mut f = fixture();
        let mut viewer = f.tables.user(f.viewer).unwrap().clone();
        viewer.is_active = false;
        f.tables.put_user(viewer).unwrap();

        assert_eq!(
            decide(&f.tables, f.viewer, f.org, names::VIEW_MEMBERS).reason(),
            Some(&DenyReason::Inactive)
        );
    }

    #[test]
    fn test_require_helpers() {
        let f = fixture();
        assert!(require_member(&f.tables, f.viewer, f.org).is_ok());
        assert_eq!(
            require_admin(&f.tables, f.viewer, f.org).unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            require_permission(&f.tables, f.outsider, f.org, names::VIEW_MEMBERS)
                .unwrap_err()
                .kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            require_member(&f.tables, f.viewer, Uuid::now_v7()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            require_member(&f.tables, Uuid::now_v7(), f.org).unwrap_err().kind(),
            ErrorKind::Unauthenticated
        );
        assert!(require_admin_or(&f.tables, f.admin, f.org, names::MANAGE_BILLING).is_ok());
    }

    #[test]
    fn test_admin_retention_guard() {
        let mut f = fixture();
        assert!(ensure_admin_retained(&f.tables, f.org, true).is_ok());

        f.tables.remove_membership(f.admin, f.org);
        assert_eq!(
            ensure_admin_retained(&f.tables, f.org, true).unwrap_err().kind(),
            ErrorKind::Conflict
        );
        assert!(ensure_admin_retained(&f.tables, f.org, false).is_ok());
    }
}

//! Authorization resolver through the service.

mod common;

use common::TestFixture;
use tenantry_core::{ErrorKind, NewRole};
use tenantry_rbac::{names, DenyReason, DEFAULT_PERMISSIONS};
use uuid::Uuid;

#[tokio::test]
async fn test_superuser_always_allowed() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let root = fx.superuser("root@tenantry.test").await;
    let acme = fx.org(&alice, "Acme").await;

    for permission in [names::MANAGE_BILLING, "launch_rockets"] {
        assert!(fx
            .service
            .authorize(root.id, acme.organization.id, permission)
            .await
            .is_allowed());
    }
    // Even for an organization that does not exist
    assert!(fx
        .service
        .authorize(root.id, Uuid::now_v7(), names::VIEW_MEMBERS)
        .await
        .is_allowed());
    assert!(fx.service.is_admin(root.id, acme.organization.id).await);

    let perms = fx
        .service
        .effective_permissions(root.id, acme.organization.id)
        .await
        .unwrap();
    assert_eq!(perms.len(), DEFAULT_PERMISSIONS.len());
}

#[tokio::test]
async fn test_non_member_denied() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let mallory = fx.user("mallory@evil.test").await;
    let acme = fx.org(&alice, "Acme").await;

    for default in DEFAULT_PERMISSIONS.iter() {
        let decision = fx
            .service
            .authorize(mallory.id, acme.organization.id, default.name)
            .await;
        assert_eq!(decision.reason(), Some(&DenyReason::NotAMember));
    }
    assert!(!fx.service.is_admin(mallory.id, acme.organization.id).await);

    let err = fx
        .service
        .list_members(mallory.id, acme.organization.id, Default::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = fx
        .service
        .effective_permissions(mallory.id, acme.organization.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_permissions_are_union_of_roles() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let bob = fx.user("bob@acme.test").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    let catalog = fx.service.list_permissions(alice.id, org_id).await.unwrap();
    let id_of = |name: &str| catalog.iter().find(|p| p.name == name).unwrap().id;

    let billing = fx
        .service
        .create_role(
            alice.id,
            org_id,
            NewRole::new("Billing").with_permissions([id_of(names::VIEW_BILLING)]),
        )
        .await
        .unwrap();
    let analytics = fx
        .service
        .create_role(
            alice.id,
            org_id,
            NewRole::new("Analytics").with_permissions([id_of(names::VIEW_ANALYTICS)]),
        )
        .await
        .unwrap();

    fx.service
        .create_join_request(bob.id, org_id)
        .await
        .unwrap();
    let pending = fx
        .service
        .list_join_requests(alice.id, org_id, None)
        .await
        .unwrap();
    fx.service
        .resolve_join_request(
            alice.id,
            org_id,
            pending[0].request.id,
            tenantry_org::JoinRequestStatus::Approved,
            Some(billing.id),
        )
        .await
        .unwrap();
    fx.service
        .update_member_roles(alice.id, org_id, bob.id, vec![billing.id, analytics.id])
        .await
        .unwrap();

    assert!(fx.service.authorize(bob.id, org_id, names::VIEW_BILLING).await.is_allowed());
    assert!(fx.service.authorize(bob.id, org_id, names::VIEW_ANALYTICS).await.is_allowed());
    let denied = fx.service.authorize(bob.id, org_id, names::MANAGE_BILLING).await;
    assert_eq!(
        denied.reason(),
        Some(&DenyReason::MissingPermission(names::MANAGE_BILLING.to_string()))
    );
}

#[tokio::test]
async fn test_admin_standing_comes_from_flag_not_name() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let bob = fx.user("bob@acme.test").await;
    let carol = fx.user("carol@acme.test").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    let lookalike = fx
        .service
        .create_role(alice.id, org_id, NewRole::new("Administrators (read-only)"))
        .await
        .unwrap();
    let owners = fx
        .service
        .create_role(alice.id, org_id, NewRole::new("Owners").with_admin(true))
        .await
        .unwrap();

    for (user, role) in [(&bob, lookalike.id), (&carol, owners.id)] {
        let request = fx
            .service
            .create_join_request(user.id, org_id)
            .await
            .unwrap()
            .into_inner();
        fx.service
            .resolve_join_request(
                alice.id,
                org_id,
                request.id,
                tenantry_org::JoinRequestStatus::Approved,
                Some(role),
            )
            .await
            .unwrap();
    }

    assert!(!fx.service.is_admin(bob.id, org_id).await);
    assert!(fx.service.is_admin(carol.id, org_id).await);
}

#[tokio::test]
async fn test_cross_tenant_entities_are_not_found() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let zed = fx.user("zed@globex.test").await;
    let acme = fx.org(&alice, "Acme").await;
    let globex = fx.org(&zed, "Globex").await;

    // Zed is an admin of Globex and asks for an Acme role through it
    let err = fx
        .service
        .get_role(zed.id, globex.organization.id, acme.admin_role.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fx
        .service
        .delete_role(zed.id, globex.organization.id, acme.admin_role.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let acme_perms = fx
        .service
        .list_permissions(alice.id, acme.organization.id)
        .await
        .unwrap();
    let err = fx
        .service
        .create_role(
            zed.id,
            globex.organization.id,
            NewRole::new("Spy").with_permissions([acme_perms[0].id]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // Asking Acme directly is a membership failure instead
    let err = fx
        .service
        .get_role(zed.id, acme.organization.id, acme.admin_role.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

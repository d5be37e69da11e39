//! End-to-end membership lifecycle through the service facade.

mod common;

use common::{token_from, TestFixture};
use tenantry_core::{ErrorKind, NewInvitation, NewOrganization, NewRole};
use tenantry_org::{InvitationStatus, JoinRequestStatus};
use tenantry_rbac::{names, DEFAULT_PERMISSIONS};

#[tokio::test]
async fn test_acme_invitation_scenario() {
    let fx = TestFixture::new();
    let alice = fx.named_user("alice@acme.test", "Alice").await;

    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    // Alice is the sole member, holding the Admin role with every seeded permission
    let members = fx
        .service
        .list_members(alice.id, org_id, Default::default())
        .await
        .unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, alice.id);
    assert!(members[0].is_admin);
    assert_eq!(members[0].roles[0].id, acme.admin_role.id);
    assert_eq!(acme.admin_role.permission_ids.len(), DEFAULT_PERMISSIONS.len());

    let perms = fx.service.effective_permissions(alice.id, org_id).await.unwrap();
    for default in DEFAULT_PERMISSIONS.iter() {
        assert!(perms.has(default.name), "missing {}", default.name);
    }

    let analyst = fx
        .service
        .create_role(alice.id, org_id, NewRole::new("Analyst"))
        .await
        .unwrap();

    let issued = fx
        .service
        .create_invitation(alice.id, org_id, NewInvitation::new("b@x.com", analyst.id))
        .await
        .unwrap();
    assert!(issued.is_clean());

    // The emailed token is the one returned to the inviter
    let emailed = token_from(&fx.last_email_text("b@x.com").await);
    assert_eq!(emailed, issued.value.token);

    let bob = fx.user("b@x.com").await;
    let membership = fx.service.accept_invitation(bob.id, &emailed).await.unwrap();
    assert_eq!(membership.organization_id, org_id);
    assert!(membership.has_role(analyst.id));
    assert_eq!(membership.role_ids.len(), 1);

    let invitations = fx.service.list_invitations(alice.id, org_id).await.unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0].status, InvitationStatus::Accepted);

    let again = fx.service.accept_invitation(bob.id, &emailed).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::Invalid);

    let snapshot = fx.service.store().snapshot().await;
    assert_eq!(
        snapshot
            .memberships_in(org_id)
            .filter(|m| m.user_id == bob.id)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_duplicate_organization_name() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let bob = fx.user("bob@acme.test").await;

    fx.org(&alice, "Acme").await;
    let err = fx
        .service
        .create_organization(bob.id, NewOrganization::new("Acme"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = fx
        .service
        .create_organization(bob.id, NewOrganization::new("  acme "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let snapshot = fx.service.store().snapshot().await;
    assert_eq!(snapshot.organizations().count(), 1);
    // Nothing from the failed attempts leaked into the store
    assert!(snapshot.memberships_of(bob.id).next().is_none());
}

#[tokio::test]
async fn test_provisioning_creates_member_role() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;

    let acme = fx
        .service
        .create_organization(
            alice.id,
            NewOrganization::new("Acme").with_industry("Logistics"),
        )
        .await
        .unwrap();

    assert_eq!(acme.organization.industry.as_deref(), Some("Logistics"));
    assert!(acme.admin_role.is_admin);
    assert!(acme.membership.has_role(acme.admin_role.id));

    let member_role = acme.member_role.expect("member role");
    assert!(!member_role.is_admin);
    assert_eq!(member_role.name, "Member");

    let detail = fx
        .service
        .get_role(alice.id, acme.organization.id, member_role.id)
        .await
        .unwrap();
    let granted: Vec<&str> = detail.permissions.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(granted, vec![names::VIEW_MEMBERS]);
}

#[tokio::test]
async fn test_blank_organization_name() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let err = fx
        .service
        .create_organization(alice.id, NewOrganization::new("   "))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
}

#[tokio::test]
async fn test_join_request_approval_grants_default_role() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let carol = fx.named_user("carol@else.test", "Carol").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    let request = fx
        .service
        .create_join_request(carol.id, org_id)
        .await
        .unwrap()
        .into_inner();

    let resolved = fx
        .service
        .resolve_join_request(alice.id, org_id, request.id, JoinRequestStatus::Approved, None)
        .await
        .unwrap();
    assert!(resolved.is_clean());

    let member_role = acme.member_role.unwrap();
    assert_eq!(resolved.value.status, JoinRequestStatus::Approved);
    assert_eq!(resolved.value.role_id, Some(member_role.id));
    assert_eq!(resolved.value.resolved_by, Some(alice.id));

    let decision = fx
        .service
        .authorize(carol.id, org_id, names::VIEW_MEMBERS)
        .await;
    assert!(decision.is_allowed());
    assert!(!fx.service.is_admin(carol.id, org_id).await);

    let text = fx.last_email_text("carol@else.test").await;
    assert!(text.contains("approved"));
}

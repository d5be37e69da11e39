//! Organization reads, updates and platform totals.

mod common;

use common::TestFixture;
use tenantry_core::{ErrorKind, NewInvitation};
use tenantry_org::OrganizationUpdate;

#[tokio::test]
async fn test_list_organizations_by_membership() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let zed = fx.user("zed@globex.test").await;
    let root = fx.superuser("root@tenantry.test").await;
    fx.org(&alice, "Acme").await;
    fx.org(&zed, "Globex").await;
    fx.org(&alice, "Initech").await;

    let names = |orgs: Vec<tenantry_org::Organization>| {
        orgs.into_iter().map(|o| o.name).collect::<Vec<_>>()
    };
    assert_eq!(
        names(fx.service.list_organizations(alice.id).await.unwrap()),
        vec!["Acme", "Initech"]
    );
    assert_eq!(
        names(fx.service.list_organizations(zed.id).await.unwrap()),
        vec!["Globex"]
    );
    assert_eq!(
        names(fx.service.list_organizations(root.id).await.unwrap()),
        vec!["Acme", "Globex", "Initech"]
    );
}

#[tokio::test]
async fn test_get_requires_membership() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let zed = fx.user("zed@globex.test").await;
    let acme = fx.org(&alice, "Acme").await;

    let org = fx.service.get_organization(alice.id, acme.organization.id).await.unwrap();
    assert_eq!(org.name, "Acme");

    let err = fx
        .service
        .get_organization(zed.id, acme.organization.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_update_organization() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let bob = fx.user("bob@acme.test").await;
    let acme = fx.org(&alice, "Acme").await;
    fx.org(&alice, "Globex").await;
    let org_id = acme.organization.id;

    let updated = fx
        .service
        .update_organization(
            alice.id,
            org_id,
            OrganizationUpdate {
                description: Some("Anvils and rockets".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description.as_deref(), Some("Anvils and rockets"));

    let err = fx
        .service
        .update_organization(
            alice.id,
            org_id,
            OrganizationUpdate {
                name: Some("GLOBEX".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Changing case of its own name is allowed
    let renamed = fx
        .service
        .update_organization(
            alice.id,
            org_id,
            OrganizationUpdate {
                name: Some("ACME".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "ACME");

    // Members without manage_settings cannot
    let issued = fx
        .service
        .create_invitation(
            alice.id,
            org_id,
            NewInvitation::new("bob@acme.test", acme.member_role.unwrap().id),
        )
        .await
        .unwrap()
        .into_inner();
    fx.service.accept_invitation(bob.id, &issued.token).await.unwrap();
    let err = fx
        .service
        .update_organization(bob.id, org_id, OrganizationUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_summary_counts() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let carol = fx.user("carol@else.test").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;
    let member_role = acme.member_role.unwrap().id;

    fx.service
        .create_invitation(alice.id, org_id, NewInvitation::new("b@x.com", member_role))
        .await
        .unwrap();
    fx.service.create_join_request(carol.id, org_id).await.unwrap();

    let summary = fx.service.organization_summary(alice.id, org_id).await.unwrap();
    assert_eq!(summary.name, "Acme");
    assert_eq!(summary.member_count, 1);
    assert_eq!(summary.role_count, 2);
    assert_eq!(summary.pending_invitations, 1);
    assert_eq!(summary.pending_join_requests, 1);
    assert_eq!(summary.your_roles, vec!["Admin".to_string()]);
    assert!(summary.is_admin);
}

#[tokio::test]
async fn test_platform_stats_superuser_only() {
    let fx = TestFixture::new();
    let alice = fx.user("alice@acme.test").await;
    let carol = fx.user("carol@else.test").await;
    let root = fx.superuser("root@tenantry.test").await;
    let acme = fx.org(&alice, "Acme").await;
    fx.service
        .create_join_request(carol.id, acme.organization.id)
        .await
        .unwrap();

    let stats = fx.service.platform_stats(root.id).await.unwrap();
    assert_eq!(stats.users, 3);
    assert_eq!(stats.organizations, 1);
    assert_eq!(stats.roles, 2);
    assert_eq!(stats.memberships, 1);
    assert_eq!(stats.pending_join_requests, 1);

    let err = fx.service.platform_stats(alice.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

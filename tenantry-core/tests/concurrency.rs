//! Racing callers redeem an invitation or approve a join request once.

mod common;

use std::sync::Arc;

use common::TestFixture;
use tenantry_core::NewInvitation;
use tenantry_org::JoinRequestStatus;

const RACERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_create_one_membership() {
    let fx = Arc::new(TestFixture::new());
    let alice = fx.user("alice@acme.test").await;
    let bob = fx.user("b@x.com").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    let issued = fx
        .service
        .create_invitation(
            alice.id,
            org_id,
            NewInvitation::new("b@x.com", acme.member_role.unwrap().id),
        )
        .await
        .unwrap()
        .into_inner();

    let bob_id = bob.id;
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let fx = Arc::clone(&fx);
            let token = issued.token.clone();
            tokio::spawn(async move { fx.service.accept_invitation(bob_id, &token).await })
        })
        .collect();
    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let snapshot = fx.service.store().snapshot().await;
    assert_eq!(
        snapshot
            .memberships_in(org_id)
            .filter(|m| m.user_id == bob.id)
            .count(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_create_one_membership() {
    let fx = Arc::new(TestFixture::new());
    let alice = fx.user("alice@acme.test").await;
    let carol = fx.user("carol@else.test").await;
    let acme = fx.org(&alice, "Acme").await;
    let org_id = acme.organization.id;

    let request = fx
        .service
        .create_join_request(carol.id, org_id)
        .await
        .unwrap()
        .into_inner();

    let (alice_id, request_id) = (alice.id, request.id);
    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let fx = Arc::clone(&fx);
            tokio::spawn(async move {
                fx.service
                    .resolve_join_request(
                        alice_id,
                        org_id,
                        request_id,
                        JoinRequestStatus::Approved,
                        None,
                    )
                    .await
            })
        })
        .collect();
    let mut successes = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 1);

    let snapshot = fx.service.store().snapshot().await;
    assert_eq!(
        snapshot
            .memberships_in(org_id)
            .filter(|m| m.user_id == carol.id)
            .count(),
        1
    );
    assert_eq!(
        snapshot.join_request(request.id).unwrap().status,
        JoinRequestStatus::Approved
    );
}

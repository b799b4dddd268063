//! Database-backed tests for the membership and invitation endpoints
//!
//! These cover the ownership guard end to end: no request sequence may leave
//! a project without an owner, whichever route the mutation arrives on.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use taskhive_shared::models::membership::{ProjectMember, ProjectRole};
use uuid::Uuid;

use common::TestContext;

#[tokio::test]
async fn removing_the_only_owner_is_a_conflict() {
    let ctx = TestContext::new().await;
    let uri = format!("/v1/projects/{}/members/{}", ctx.project.id, ctx.owner.id);

    let (status, body) = ctx.send("DELETE", &uri, &ctx.owner, None).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("conflict"));

    // The membership row is untouched.
    let row = ProjectMember::find(&ctx.db, ctx.project.id, ctx.owner.id)
        .await
        .unwrap()
        .expect("owner row survives");
    assert_eq!(row.role, ProjectRole::Owner);

    ctx.cleanup().await;
}

#[tokio::test]
async fn demoting_the_only_owner_is_a_conflict() {
    let ctx = TestContext::new().await;
    let uri = format!("/v1/projects/{}/members/{}", ctx.project.id, ctx.owner.id);

    let (status, _) = ctx
        .send("PUT", &uri, &ctx.owner, Some(json!({"role": "member"})))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);

    let row = ProjectMember::find(&ctx.db, ctx.project.id, ctx.owner.id)
        .await
        .unwrap()
        .expect("owner row survives");
    assert_eq!(row.role, ProjectRole::Owner);

    ctx.cleanup().await;
}

#[tokio::test]
async fn the_only_owner_cannot_leave() {
    let ctx = TestContext::new().await;
    let uri = format!("/v1/projects/{}/members/leave", ctx.project.id);

    let (status, _) = ctx.send("POST", &uri, &ctx.owner, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.cleanup().await;
}

#[tokio::test]
async fn an_owner_can_be_removed_once_another_exists() {
    let ctx = TestContext::new().await;

    // Promote the member to a second owner.
    let promote = format!("/v1/projects/{}/members/{}", ctx.project.id, ctx.member.id);
    let (status, _) = ctx
        .send("PUT", &promote, &ctx.owner, Some(json!({"role": "owner"})))
        .await;
    assert_eq!(status, StatusCode::OK);

    // With two owners the original one may be removed.
    let remove = format!("/v1/projects/{}/members/{}", ctx.project.id, ctx.owner.id);
    let (status, _) = ctx.send("DELETE", &remove, &ctx.owner, None).await;
    assert_eq!(status, StatusCode::OK);

    assert!(ProjectMember::find(&ctx.db, ctx.project.id, ctx.owner.id)
        .await
        .unwrap()
        .is_none());

    ctx.cleanup().await;
}

#[tokio::test]
async fn ownership_transfer_lets_the_old_owner_leave() {
    let ctx = TestContext::new().await;

    let transfer = format!("/v1/projects/{}/transfer-ownership", ctx.project.id);
    let (status, body) = ctx
        .send(
            "POST",
            &transfer,
            &ctx.owner,
            Some(json!({"new_owner_id": ctx.member.id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transferred"], json!(true));

    let new_owner = ProjectMember::find(&ctx.db, ctx.project.id, ctx.member.id)
        .await
        .unwrap()
        .expect("new owner row");
    assert_eq!(new_owner.role, ProjectRole::Owner);

    let old_owner = ProjectMember::find(&ctx.db, ctx.project.id, ctx.owner.id)
        .await
        .unwrap()
        .expect("old owner row");
    assert_eq!(old_owner.role, ProjectRole::Collaborator);

    // No longer the last owner, so leaving succeeds.
    let leave = format!("/v1/projects/{}/members/leave", ctx.project.id);
    let (status, _) = ctx.send("POST", &leave, &ctx.owner, None).await;
    assert_eq!(status, StatusCode::OK);

    ctx.cleanup().await;
}

#[tokio::test]
async fn ownership_transfer_requires_an_existing_member() {
    let ctx = TestContext::new().await;

    let transfer = format!("/v1/projects/{}/transfer-ownership", ctx.project.id);
    let (status, _) = ctx
        .send(
            "POST",
            &transfer,
            &ctx.owner,
            Some(json!({"new_owner_id": ctx.outsider.id})),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);

    // The caller is still the owner.
    let row = ProjectMember::find(&ctx.db, ctx.project.id, ctx.owner.id)
        .await
        .unwrap()
        .expect("owner row survives");
    assert_eq!(row.role, ProjectRole::Owner);

    ctx.cleanup().await;
}

#[tokio::test]
async fn a_second_pending_invitation_for_the_same_email_is_a_conflict() {
    let ctx = TestContext::new().await;
    let uri = format!("/v1/projects/{}/invitations", ctx.project.id);
    let email = format!("invitee-{}@example.com", Uuid::new_v4());

    let (status, _) = ctx
        .send("POST", &uri, &ctx.owner, Some(json!({"email": email})))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx
        .send("POST", &uri, &ctx.owner, Some(json!({"email": email})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("conflict"));

    ctx.cleanup().await;
}

#[tokio::test]
async fn accepting_an_invitation_joins_the_project() {
    let ctx = TestContext::new().await;
    let create = format!("/v1/projects/{}/invitations", ctx.project.id);
    let email = format!("invitee-{}@example.com", Uuid::new_v4());

    let (status, body) = ctx
        .send("POST", &create, &ctx.owner, Some(json!({"email": email})))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().expect("invitation token").to_string();

    // The token is the capability; the outsider's account email differs
    // from the invited address.
    let accept = format!("/v1/invitations/{}/accept", token);
    let (status, _) = ctx.send("POST", &accept, &ctx.outsider, None).await;
    assert_eq!(status, StatusCode::OK);

    let row = ProjectMember::find(&ctx.db, ctx.project.id, ctx.outsider.id)
        .await
        .unwrap()
        .expect("new member row");
    assert_eq!(row.role, ProjectRole::Member);

    // A spent invitation cannot be accepted again.
    let (status, _) = ctx.send("POST", &accept, &ctx.member, None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.cleanup().await;
}

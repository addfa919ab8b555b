use super::*;
use crate::plugins::test_helpers::{self, json_body, post};
use clubhub_core::adapters::{AuditOps, ClubOps, MemoryDatabaseAdapter, UserOps};
use clubhub_core::types::{AuditLogQuery, UpdateClub};
use clubhub_core::{ClubRole, GlobalRole, MembershipStatus, User};

async fn create_admin_context() -> (HubContext<MemoryDatabaseAdapter>, User, String, User, String) {
    let ctx = test_helpers::create_test_context();
    let (admin, admin_token) = test_helpers::signed_in(&ctx, "Admin", GlobalRole::Admin).await;
    let (user, user_token) = test_helpers::signed_in(&ctx, "Student", GlobalRole::Student).await;
    (ctx, admin, admin_token, user, user_token)
}

fn set_role(token: &str, user_id: &str, role: &str) -> HubRequest {
    post(
        "/admin/set-role",
        token,
        serde_json::json!({ "userId": user_id, "role": role }),
    )
}

#[tokio::test]
async fn test_set_role() {
    let (ctx, admin, admin_token, user, _) = create_admin_context().await;
    let plugin = AdminPlugin::new();

    let resp = plugin
        .on_request(&set_role(&admin_token, &user.id, "coordinator"), &ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(resp.status, 200);
    let body = json_body(&resp);
    assert_eq!(body["user"]["role"], "coordinator");
    assert_eq!(body["changed"], true);

    let logs = ctx
        .database
        .list_audit_logs(AuditLogQuery {
            limit: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(logs[0].action, "user.set_role");
    assert_eq!(logs[0].actor_id, admin.id);
    assert_eq!(logs[0].details["to"], "coordinator");
}

#[tokio::test]
async fn test_set_same_role_is_noop() {
    let (ctx, _admin, admin_token, user, _) = create_admin_context().await;
    let resp = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &user.id, "student"), &ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(json_body(&resp)["changed"], false);
}

#[tokio::test]
async fn test_non_admin_rejected() {
    let (ctx, _admin, _, user, user_token) = create_admin_context().await;
    let err = AdminPlugin::new()
        .on_request(&set_role(&user_token, &user.id, "admin"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_unauthenticated_rejected() {
    let (ctx, ..) = create_admin_context().await;
    let err = AdminPlugin::new()
        .on_request(&test_helpers::get("/admin/list-users", None, &[]), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_admin_cannot_change_own_role() {
    let (ctx, admin, admin_token, ..) = create_admin_context().await;
    let err = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &admin.id, "student"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_unknown_role_rejected() {
    let (ctx, _admin, admin_token, user, _) = create_admin_context().await;
    let err = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &user.id, "superuser"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_cannot_demote_assigned_coordinator() {
    let (ctx, _admin, admin_token, ..) = create_admin_context().await;
    let coordinator = test_helpers::create_user(&ctx, "Coord", GlobalRole::Coordinator).await;
    let club = test_helpers::create_club(&ctx, "Chess", &coordinator).await;
    let plugin = AdminPlugin::new();

    let err = plugin
        .on_request(&set_role(&admin_token, &coordinator.id, "student"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);

    // Once the club is archived the coordinator is free
    ctx.database
        .update_club(
            &club.id,
            UpdateClub {
                status: Some(clubhub_core::ClubStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let resp = plugin
        .on_request(&set_role(&admin_token, &coordinator.id, "student"), &ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(json_body(&resp)["user"]["role"], "student");
}

#[tokio::test]
async fn test_member_cannot_become_staff() {
    let (ctx, _admin, admin_token, user, _) = create_admin_context().await;
    let coordinator = test_helpers::create_user(&ctx, "Coord", GlobalRole::Coordinator).await;
    let club = test_helpers::create_club(&ctx, "Drama", &coordinator).await;
    test_helpers::add_member(&ctx, &club, &user, ClubRole::Member).await;

    let err = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &user.id, "coordinator"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_applicant_cannot_become_staff() {
    let (ctx, _admin, admin_token, user, _) = create_admin_context().await;
    let coordinator = test_helpers::create_user(&ctx, "Coord", GlobalRole::Coordinator).await;
    let club = test_helpers::create_club(&ctx, "Drama", &coordinator).await;
    test_helpers::add_membership(&ctx, &club, &user, ClubRole::Member, MembershipStatus::Pending)
        .await;

    let err = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &user.id, "coordinator"), &ctx)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    let stored = ctx.database.get_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.role, GlobalRole::Student);
}

#[tokio::test]
async fn test_rejected_application_does_not_block_promotion() {
    let (ctx, _admin, admin_token, user, _) = create_admin_context().await;
    let coordinator = test_helpers::create_user(&ctx, "Coord", GlobalRole::Coordinator).await;
    let club = test_helpers::create_club(&ctx, "Drama", &coordinator).await;
    test_helpers::add_membership(&ctx, &club, &user, ClubRole::Member, MembershipStatus::Rejected)
        .await;

    let resp = AdminPlugin::new()
        .on_request(&set_role(&admin_token, &user.id, "coordinator"), &ctx)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(json_body(&resp)["user"]["role"], "coordinator");
}

#[tokio::test]
async fn test_list_users_with_role_filter_and_pagination() {
    let (ctx, _admin, admin_token, ..) = create_admin_context().await;
    for name in ["A", "B", "C"] {
        test_helpers::create_user(&ctx, name, GlobalRole::Student).await;
    }
    let plugin = AdminPlugin::new();

    let resp = plugin
        .on_request(
            &test_helpers::get(
                "/admin/list-users",
                Some(admin_token.as_str()),
                &[("role", "student"), ("limit", "2")],
            ),
            &ctx,
        )
        .await
        .unwrap()
        .unwrap();
    let body = json_body(&resp);
    assert_eq!(body["total"], 4);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);
    assert_eq!(body["limit"], 2);
}

#[tokio::test]
async fn test_list_users_respects_max_page_limit() {
    let (ctx, _admin, admin_token, ..) = create_admin_context().await;
    let resp = AdminPlugin::new()
        .max_page_limit(1)
        .on_request(
            &test_helpers::get("/admin/list-users", Some(admin_token.as_str()), &[("limit", "50")]),
            &ctx,
        )
        .await
        .unwrap()
        .unwrap();
    let body = json_body(&resp);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_admin_path_returns_none() {
    let (ctx, _admin, admin_token, ..) = create_admin_context().await;
    let result = AdminPlugin::new()
        .on_request(&test_helpers::get("/club/list", Some(admin_token.as_str()), &[]), &ctx)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_bootstrap_admin_is_idempotent() {
    let ctx = test_helpers::create_test_context();

    let first = bootstrap_admin(&ctx, "Root", "root@campus.edu", "password123")
        .await
        .unwrap();
    assert_eq!(first.role, GlobalRole::Admin);
    assert!(first.password_hash.is_some());

    let second = bootstrap_admin(&ctx, "Root", "root@campus.edu", "password123")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn test_bootstrap_admin_promotes_existing_user() {
    let ctx = test_helpers::create_test_context();
    let existing = test_helpers::create_user(&ctx, "Dean", GlobalRole::Student).await;

    let admin = bootstrap_admin(&ctx, "Dean", "dean@campus.edu", "password123")
        .await
        .unwrap();
    assert_eq!(admin.id, existing.id);
    let stored = ctx.database.get_user_by_id(&existing.id).await.unwrap().unwrap();
    assert_eq!(stored.role, GlobalRole::Admin);
}

#[tokio::test]
async fn test_bootstrap_admin_refuses_club_member() {
    let ctx = test_helpers::create_test_context();
    let coordinator = test_helpers::create_user(&ctx, "Coord", GlobalRole::Coordinator).await;
    let club = test_helpers::create_club(&ctx, "Chess", &coordinator).await;
    let dean = test_helpers::create_user(&ctx, "Dean", GlobalRole::Student).await;
    test_helpers::add_member(&ctx, &club, &dean, ClubRole::Member).await;

    let err = bootstrap_admin(&ctx, "Dean", "dean@campus.edu", "password123")
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    let stored = ctx.database.get_user_by_id(&dean.id).await.unwrap().unwrap();
    assert_eq!(stored.role, GlobalRole::Student);
}

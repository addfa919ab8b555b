use serde_json::json;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::rbac::{Action, Resource};
use clubhub_core::types::{
    CreateAuditLog, CreateClub, CreateNotification, UpdateClub, UpdateMembership,
};
use clubhub_core::{
    Club, ClubCategory, ClubStatus, GlobalRole, HubContext, HubError, HubResult, MembershipStatus,
    NotificationKind, User,
};

use crate::plugins::helpers::{
    admin_ids, cache_get, cache_put, invalidate_club_cache, leadership_ids, load_club,
    require_admin, require_club_permission,
};

use super::types::*;

// ---------------------------------------------------------------------------
// Core functions -- framework-agnostic business logic
// ---------------------------------------------------------------------------

async fn require_coordinator<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user_id: &str,
) -> HubResult<User> {
    let user = ctx
        .database
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| HubError::not_found("Coordinator not found"))?;
    if user.role != GlobalRole::Coordinator {
        return Err(HubError::bad_request(
            "The assigned user must have the coordinator role",
        ));
    }
    Ok(user)
}

fn club_link(club: &Club) -> String {
    format!("/clubs/{}", club.id)
}

pub(crate) async fn create_club_core<DB: DatabaseAdapter>(
    body: CreateClubRequest,
    admin: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let coordinator = require_coordinator(ctx, &body.coordinator_id).await?;

    let club = ctx
        .database
        .create_club(CreateClub {
            name: body.name.trim().to_string(),
            category: body.category,
            description: body.description,
            coordinator_id: coordinator.id.clone(),
        })
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&admin.id, "club.create", "club", &club.id)
                .club(&club.id)
                .details(json!({ "name": club.name, "coordinatorId": coordinator.id })),
        )
        .await;

    ctx.notifier()
        .notify_quietly(
            CreateNotification::new(
                &coordinator.id,
                NotificationKind::ClubCreated,
                "New club assigned",
                format!("You are now the coordinator of {}", club.name),
            )
            .link(club_link(&club)),
        )
        .await;

    Ok(ClubResponse { club })
}

pub(crate) async fn update_club_core<DB: DatabaseAdapter>(
    body: UpdateClubRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Club, Action::Update).await?;

    if club.status == ClubStatus::Archived {
        return Err(HubError::bad_request("Archived clubs cannot be edited"));
    }

    let coordinator_id = match body.coordinator_id {
        Some(id) if id != club.coordinator_id => {
            require_admin(user)?;
            Some(require_coordinator(ctx, &id).await?.id)
        }
        _ => None,
    };

    let updated = ctx
        .database
        .update_club(
            &club.id,
            UpdateClub {
                name: body.name.map(|n| n.trim().to_string()),
                category: body.category,
                description: body.description,
                coordinator_id: coordinator_id.clone(),
                ..Default::default()
            },
        )
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "club.update", "club", &club.id)
                .club(&club.id)
                .details(json!({ "coordinatorId": coordinator_id })),
        )
        .await;

    Ok(ClubResponse { club: updated })
}

pub(crate) async fn list_clubs_core<DB: DatabaseAdapter>(
    status: ClubStatus,
    category: Option<ClubCategory>,
    ctx: &HubContext<DB>,
) -> HubResult<ListClubsResponse> {
    let key = match category {
        Some(category) => format!("club:list:{}:{:?}", status, category),
        None => format!("club:list:{}", status),
    };
    if let Some(cached) = cache_get::<DB, ListClubsResponse>(ctx, &key).await {
        return Ok(cached);
    }

    let clubs = ctx
        .database
        .list_clubs(Some(status))
        .await?
        .into_iter()
        .filter(|c| category.is_none_or(|cat| c.category == cat))
        .collect();
    let response = ListClubsResponse { clubs };

    cache_put(ctx, &key, &response).await;
    Ok(response)
}

pub(crate) async fn get_club_core<DB: DatabaseAdapter>(
    club_id: &str,
    ctx: &HubContext<DB>,
) -> HubResult<ClubDetailsResponse> {
    let key = format!("club:get:{}", club_id);
    if let Some(cached) = cache_get::<DB, ClubDetailsResponse>(ctx, &key).await {
        return Ok(cached);
    }

    let club = load_club(ctx, club_id).await?;
    let members = ctx
        .database
        .list_club_memberships(&club.id, Some(MembershipStatus::Approved))
        .await?;

    let mut leaders = Vec::new();
    for membership in members.iter().filter(|m| m.role.is_elevated()) {
        if let Some(user) = ctx.database.get_user_by_id(&membership.user_id).await? {
            leaders.push(ClubLeader {
                user_id: user.id,
                name: user.name,
                role: membership.role,
            });
        }
    }
    leaders.sort_by(|a, b| b.role.tier().cmp(&a.role.tier()).then_with(|| a.name.cmp(&b.name)));

    let response = ClubDetailsResponse {
        club,
        member_count: members.len(),
        leaders,
    };

    cache_put(ctx, &key, &response).await;
    Ok(response)
}

pub(crate) async fn request_archive_core<DB: DatabaseAdapter>(
    body: RequestArchiveRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Club, Action::Archive).await?;

    if club.status != ClubStatus::Active {
        return Err(HubError::bad_request(format!(
            "Only active clubs can be archived; this club is {}",
            club.status
        )));
    }

    let updated = ctx
        .database
        .update_club(
            &club.id,
            UpdateClub {
                status: Some(ClubStatus::PendingArchive),
                archive_reason: Some(Some(body.reason.clone())),
                ..Default::default()
            },
        )
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "club.request_archive", "club", &club.id)
                .club(&club.id)
                .details(json!({ "reason": body.reason })),
        )
        .await;

    let notification = CreateNotification::new(
        "",
        NotificationKind::ClubArchiveRequested,
        "Archive requested",
        format!("{} has requested to be archived", club.name),
    )
    .link(club_link(&club));
    ctx.notifier()
        .notify_all_quietly(admin_ids(ctx).await?, &notification)
        .await;

    Ok(ClubResponse { club: updated })
}

pub(crate) async fn approve_archive_core<DB: DatabaseAdapter>(
    body: ClubIdRequest,
    admin: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    if club.status != ClubStatus::PendingArchive {
        return Err(HubError::bad_request("No archive request is pending for this club"));
    }

    let updated = ctx
        .database
        .update_club(
            &club.id,
            UpdateClub {
                status: Some(ClubStatus::Archived),
                ..Default::default()
            },
        )
        .await?;

    let pending = ctx
        .database
        .list_club_memberships(&club.id, Some(MembershipStatus::Pending))
        .await?;
    for membership in &pending {
        ctx.database
            .update_membership(
                &membership.id,
                UpdateMembership {
                    status: Some(MembershipStatus::Rejected),
                    decision_reason: Some("Club archived".to_string()),
                    decided_by: Some(admin.id.clone()),
                    ..Default::default()
                },
            )
            .await?;
    }

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&admin.id, "club.archive", "club", &club.id)
                .club(&club.id)
                .details(json!({ "rejectedApplications": pending.len() })),
        )
        .await;

    let mut recipients = leadership_ids(ctx, &club.id).await?;
    recipients.push(club.coordinator_id.clone());
    let notification = CreateNotification::new(
        "",
        NotificationKind::ClubArchived,
        "Club archived",
        format!("{} has been archived", club.name),
    );
    ctx.notifier()
        .notify_all_quietly(recipients, &notification)
        .await;

    Ok(ClubResponse { club: updated })
}

pub(crate) async fn reject_archive_core<DB: DatabaseAdapter>(
    body: ClubIdRequest,
    admin: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    if club.status != ClubStatus::PendingArchive {
        return Err(HubError::bad_request("No archive request is pending for this club"));
    }
    reactivate(club, admin, "club.reject_archive", ctx).await
}

pub(crate) async fn restore_club_core<DB: DatabaseAdapter>(
    body: ClubIdRequest,
    admin: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    if club.status != ClubStatus::Archived {
        return Err(HubError::bad_request("Only archived clubs can be restored"));
    }
    reactivate(club, admin, "club.restore", ctx).await
}

async fn reactivate<DB: DatabaseAdapter>(
    club: Club,
    admin: &User,
    action: &str,
    ctx: &HubContext<DB>,
) -> HubResult<ClubResponse> {
    let updated = ctx
        .database
        .update_club(
            &club.id,
            UpdateClub {
                status: Some(ClubStatus::Active),
                archive_reason: Some(None),
                ..Default::default()
            },
        )
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(CreateAuditLog::new(&admin.id, action, "club", &club.id).club(&club.id))
        .await;

    Ok(ClubResponse { club: updated })
}

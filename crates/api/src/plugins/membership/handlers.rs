use serde_json::json;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::rbac::{self, Action, ClubScope, Grant, Resource};
use clubhub_core::roles::{self, Actor, RoleChange, RoleChangeRequest};
use clubhub_core::types::{CreateAuditLog, CreateMembership, CreateNotification, UpdateMembership};
use clubhub_core::{
    Club, ClubRole, GlobalRole, HubContext, HubError, HubResult, Membership, MembershipStatus,
    NotificationKind, User,
};

use crate::plugins::helpers::{
    invalidate_club_cache, leadership_ids, load_club, load_membership, membership_in,
    require_club_permission,
};

use super::types::*;

// ---------------------------------------------------------------------------
// Core functions -- framework-agnostic business logic
// ---------------------------------------------------------------------------

fn club_link(club: &Club) -> String {
    format!("/clubs/{}", club.id)
}

async fn notify_member<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user_id: &str,
    kind: NotificationKind,
    title: &str,
    message: String,
    club: &Club,
) {
    let notification = CreateNotification::new(user_id, kind, title, message).link(club_link(club));
    ctx.notifier().notify_quietly(notification).await;
}

/// Non-rejected memberships of `user_id`, each with its club's name.
pub(crate) async fn memberships_with_club<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user_id: &str,
) -> HubResult<Vec<MembershipWithClub>> {
    let mut result = Vec::new();
    for membership in ctx.database.list_user_memberships(user_id, None).await? {
        if membership.status == MembershipStatus::Rejected {
            continue;
        }
        let club_name = ctx
            .database
            .get_club_by_id(&membership.club_id)
            .await?
            .map(|c| c.name);
        result.push(MembershipWithClub {
            membership,
            club_name,
        });
    }
    Ok(result)
}

pub(crate) async fn apply_core<DB: DatabaseAdapter>(
    body: ApplyRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    if user.role != GlobalRole::Student {
        return Err(HubError::forbidden("Only students can join clubs"));
    }

    let club = load_club(ctx, &body.club_id).await?;
    if !club.is_active() {
        return Err(HubError::bad_request("This club is not accepting applications"));
    }

    let max = ctx.config.membership.max_club_memberships;
    let held = ctx
        .database
        .list_user_memberships(&user.id, None)
        .await?
        .into_iter()
        .filter(|m| m.status != MembershipStatus::Rejected)
        .count();
    if held >= max {
        return Err(HubError::bad_request(format!(
            "Students may belong to at most {} clubs",
            max
        )));
    }

    let membership = ctx
        .database
        .create_membership(CreateMembership {
            user_id: user.id.clone(),
            club_id: club.id.clone(),
            role: ClubRole::Member,
            status: MembershipStatus::Pending,
            message: body.message,
        })
        .await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.apply", "membership", &membership.id)
                .club(&club.id),
        )
        .await;

    let mut reviewers = leadership_ids(ctx, &club.id).await?;
    reviewers.push(club.coordinator_id.clone());
    let notification = CreateNotification::new(
        "",
        NotificationKind::MembershipApplied,
        "New membership application",
        format!("{} applied to join {}", user.name, club.name),
    )
    .link(club_link(&club));
    ctx.notifier()
        .notify_all_quietly(reviewers, &notification)
        .await;

    Ok(MembershipResponse {
        membership,
        changed: true,
    })
}

pub(crate) async fn approve_core<DB: DatabaseAdapter>(
    body: MembershipIdRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    let membership = load_membership(ctx, &body.membership_id).await?;
    let club = load_club(ctx, &membership.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Membership, Action::Approve).await?;

    match membership.status {
        MembershipStatus::Approved => {
            return Ok(MembershipResponse {
                membership,
                changed: false,
            });
        }
        MembershipStatus::Rejected => {
            return Err(HubError::bad_request("This application was already rejected"));
        }
        MembershipStatus::Pending => {}
    }

    if !club.is_active() {
        return Err(HubError::bad_request("This club is not accepting members"));
    }

    let applicant = ctx
        .database
        .get_user_by_id(&membership.user_id)
        .await?
        .ok_or_else(|| HubError::not_found("Applicant not found"))?;
    if applicant.role != GlobalRole::Student {
        return Err(HubError::bad_request(
            "Coordinators and admins cannot hold club memberships",
        ));
    }

    let max = ctx.config.membership.max_club_memberships;
    let approved = ctx
        .database
        .list_user_memberships(&membership.user_id, Some(MembershipStatus::Approved))
        .await?
        .len();
    if approved >= max {
        return Err(HubError::bad_request(format!(
            "The applicant already belongs to {} clubs",
            max
        )));
    }

    let updated = ctx
        .database
        .update_membership(
            &membership.id,
            UpdateMembership {
                status: Some(MembershipStatus::Approved),
                decided_by: Some(user.id.clone()),
                ..Default::default()
            },
        )
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.approve", "membership", &updated.id)
                .club(&club.id),
        )
        .await;

    notify_member(
        ctx,
        &updated.user_id,
        NotificationKind::MembershipApproved,
        "Application approved",
        format!("Welcome to {}!", club.name),
        &club,
    )
    .await;

    Ok(MembershipResponse {
        membership: updated,
        changed: true,
    })
}

pub(crate) async fn reject_core<DB: DatabaseAdapter>(
    body: RejectRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    let membership = load_membership(ctx, &body.membership_id).await?;
    let club = load_club(ctx, &membership.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Membership, Action::Approve).await?;

    match membership.status {
        MembershipStatus::Rejected => {
            return Ok(MembershipResponse {
                membership,
                changed: false,
            });
        }
        MembershipStatus::Approved => {
            return Err(HubError::bad_request(
                "Approved members are removed, not rejected",
            ));
        }
        MembershipStatus::Pending => {}
    }

    let updated = ctx
        .database
        .update_membership(
            &membership.id,
            UpdateMembership {
                status: Some(MembershipStatus::Rejected),
                decision_reason: body.reason.clone(),
                decided_by: Some(user.id.clone()),
                ..Default::default()
            },
        )
        .await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.reject", "membership", &updated.id)
                .club(&club.id)
                .details(json!({ "reason": body.reason })),
        )
        .await;

    let message = match &body.reason {
        Some(reason) => format!("Your application to {} was declined: {}", club.name, reason),
        None => format!("Your application to {} was declined", club.name),
    };
    notify_member(
        ctx,
        &updated.user_id,
        NotificationKind::MembershipRejected,
        "Application declined",
        message,
        &club,
    )
    .await;

    Ok(MembershipResponse {
        membership: updated,
        changed: true,
    })
}

pub(crate) async fn update_role_core<DB: DatabaseAdapter>(
    body: UpdateRoleRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    let target = load_membership(ctx, &body.membership_id).await?;
    let club = load_club(ctx, &target.club_id).await?;

    if !club.is_active() {
        return Err(HubError::bad_request("Roles cannot change while the club is being archived"));
    }

    let actor_membership = membership_in(ctx, &club.id, &user.id).await?;
    let club_memberships = ctx
        .database
        .list_club_memberships(&club.id, Some(MembershipStatus::Approved))
        .await?;
    let other_memberships = ctx
        .database
        .list_user_memberships(&target.user_id, Some(MembershipStatus::Approved))
        .await?;

    let change = roles::check_role_change(&RoleChangeRequest {
        actor: Actor {
            user,
            membership: actor_membership.as_ref(),
            is_coordinator: user.role == GlobalRole::Coordinator
                && club.coordinator_id == user.id,
        },
        target: &target,
        requested: body.role,
        club_memberships: &club_memberships,
        other_memberships: &other_memberships,
    })?;

    let RoleChange::Changed { from, to } = change else {
        return Ok(MembershipResponse {
            membership: target,
            changed: false,
        });
    };

    let updated = ctx
        .database
        .update_membership(
            &target.id,
            UpdateMembership {
                role: Some(to),
                ..Default::default()
            },
        )
        .await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.update_role", "membership", &updated.id)
                .club(&club.id)
                .details(json!({ "from": from, "to": to })),
        )
        .await;

    notify_member(
        ctx,
        &updated.user_id,
        NotificationKind::RoleChanged,
        "Role updated",
        format!("Your role in {} is now {}", club.name, to),
        &club,
    )
    .await;

    Ok(MembershipResponse {
        membership: updated,
        changed: true,
    })
}

pub(crate) async fn remove_core<DB: DatabaseAdapter>(
    body: MembershipIdRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    let target = load_membership(ctx, &body.membership_id).await?;
    let club = load_club(ctx, &target.club_id).await?;
    let grant =
        require_club_permission(ctx, user, &club, Resource::Membership, Action::Delete).await?;

    if target.user_id == user.id {
        return Err(HubError::bad_request("Use leave to exit a club"));
    }
    if !target.is_approved() {
        return Err(HubError::bad_request(
            "Only approved members can be removed; reject pending applications instead",
        ));
    }
    if let Grant::ClubRole(role) = grant {
        if role.is_leadership() && target.role.is_leadership() {
            return Err(HubError::forbidden(
                "Only the coordinator can remove club leadership",
            ));
        }
    }

    ctx.database.delete_membership(&target.id).await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.remove", "membership", &target.id)
                .club(&club.id)
                .details(json!({ "userId": target.user_id, "role": target.role })),
        )
        .await;

    notify_member(
        ctx,
        &target.user_id,
        NotificationKind::MemberRemoved,
        "Removed from club",
        format!("You have been removed from {}", club.name),
        &club,
    )
    .await;

    Ok(MembershipResponse {
        membership: target,
        changed: true,
    })
}

pub(crate) async fn leave_core<DB: DatabaseAdapter>(
    body: ClubIdRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<MembershipResponse> {
    let membership = membership_in(ctx, &body.club_id, &user.id)
        .await?
        .ok_or_else(|| HubError::not_found("You are not a member of this club"))?;

    if membership.role == ClubRole::President && membership.is_approved() {
        return Err(HubError::bad_request(
            "The president must hand over the role before leaving",
        ));
    }

    ctx.database.delete_membership(&membership.id).await?;

    invalidate_club_cache(ctx).await;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "membership.leave", "membership", &membership.id)
                .club(&membership.club_id)
                .details(json!({ "role": membership.role })),
        )
        .await;

    Ok(MembershipResponse {
        membership,
        changed: true,
    })
}

pub(crate) async fn list_core<DB: DatabaseAdapter>(
    club_id: &str,
    status: Option<MembershipStatus>,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ListMembershipsResponse<MembershipWithUser>> {
    let club = load_club(ctx, club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Membership, Action::Read).await?;

    let mut memberships = Vec::new();
    for membership in ctx.database.list_club_memberships(&club.id, status).await? {
        let holder = ctx
            .database
            .get_user_by_id(&membership.user_id)
            .await?
            .map(|u| MemberSummary {
                id: u.id,
                name: u.name,
                email: u.email,
            });
        memberships.push(MembershipWithUser {
            membership,
            user: holder,
        });
    }

    Ok(ListMembershipsResponse { memberships })
}

pub(crate) async fn has_permission_core<DB: DatabaseAdapter>(
    body: &HasPermissionRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<HasPermissionResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    let membership: Option<Membership> = membership_in(ctx, &club.id, &user.id).await?;
    let scope = ClubScope::new(&club, membership.as_ref());

    let has_all_permissions = body.permissions.iter().all(|(resource, actions)| {
        let Some(resource) = Resource::parse(resource) else {
            return false;
        };
        actions.iter().all(|action| {
            Action::parse(action)
                .is_some_and(|action| rbac::evaluate(user, Some(scope), resource, action).allowed)
        })
    });

    Ok(HasPermissionResponse {
        success: has_all_permissions,
        error: if has_all_permissions {
            None
        } else {
            Some("Permission denied".to_string())
        },
    })
}

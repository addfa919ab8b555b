use serde_json::json;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::password::{hash_password, validate_password};
use clubhub_core::types::{
    CreateAuditLog, CreateUser, ListUsersParams, MembershipStatus, UpdateUser,
};
use clubhub_core::{ClubStatus, GlobalRole, HubContext, HubError, HubResult, User};

use super::types::*;

// ---------------------------------------------------------------------------
// Core functions -- framework-agnostic business logic
// ---------------------------------------------------------------------------

pub(crate) async fn set_role_core<DB: DatabaseAdapter>(
    body: &SetRoleRequest,
    admin: &User,
    ctx: &HubContext<DB>,
) -> HubResult<SetRoleResponse> {
    let role = GlobalRole::parse(&body.role)
        .ok_or_else(|| HubError::bad_request(format!("Unknown role: {}", body.role)))?;

    if body.user_id == admin.id {
        return Err(HubError::bad_request("You cannot change your own role"));
    }

    let target = ctx
        .database
        .get_user_by_id(&body.user_id)
        .await?
        .ok_or_else(|| HubError::not_found("User not found"))?;

    if target.role == role {
        return Ok(SetRoleResponse {
            user: target,
            changed: false,
        });
    }

    if target.role == GlobalRole::Coordinator {
        let assigned = ctx
            .database
            .list_coordinated_clubs(&target.id)
            .await?
            .into_iter()
            .find(|club| club.status != ClubStatus::Archived);
        if let Some(club) = assigned {
            return Err(HubError::bad_request(format!(
                "User still coordinates {}; reassign the club first",
                club.name
            )));
        }
    }

    if matches!(role, GlobalRole::Coordinator | GlobalRole::Admin) {
        ensure_no_memberships(ctx, &target).await?;
    }

    let from = target.role;
    let user = ctx
        .database
        .update_user(
            &target.id,
            UpdateUser {
                role: Some(role),
                ..Default::default()
            },
        )
        .await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&admin.id, "user.set_role", "user", &user.id)
                .details(json!({ "from": from, "to": role })),
        )
        .await;

    Ok(SetRoleResponse {
        user,
        changed: true,
    })
}

/// Staff never hold memberships, pending applications included.
async fn ensure_no_memberships<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user: &User,
) -> HubResult<()> {
    let held = ctx
        .database
        .list_user_memberships(&user.id, None)
        .await?
        .into_iter()
        .any(|m| m.status != MembershipStatus::Rejected);
    if held {
        return Err(HubError::bad_request(
            "Users holding or applying for club memberships cannot become staff",
        ));
    }
    Ok(())
}

pub(crate) async fn list_users_core<DB: DatabaseAdapter>(
    query: &ListUsersQuery,
    ctx: &HubContext<DB>,
) -> HubResult<ListUsersResponse> {
    let role = query
        .role
        .as_deref()
        .map(|r| {
            GlobalRole::parse(r)
                .ok_or_else(|| HubError::bad_request(format!("Unknown role: {}", r)))
        })
        .transpose()?;

    let (users, total) = ctx
        .database
        .list_users(ListUsersParams {
            role,
            limit: Some(query.page.limit),
            offset: Some(query.page.offset),
        })
        .await?;

    Ok(ListUsersResponse {
        users,
        total,
        limit: query.page.limit,
        offset: query.page.offset,
    })
}

/// Ensure an admin account exists for `email`.
///
/// Creates the account when missing and promotes an existing user otherwise.
/// Calling it again with the same email changes nothing.
pub async fn bootstrap_admin<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    name: &str,
    email: &str,
    password: &str,
) -> HubResult<User> {
    if let Some(existing) = ctx.database.get_user_by_email(email).await? {
        if existing.role == GlobalRole::Admin {
            return Ok(existing);
        }
        ensure_no_memberships(ctx, &existing).await?;
        ctx.logger()
            .warn(&format!("Promoting existing user {} to admin", existing.id));
        return ctx
            .database
            .update_user(
                &existing.id,
                UpdateUser {
                    role: Some(GlobalRole::Admin),
                    ..Default::default()
                },
            )
            .await;
    }

    validate_password(password, &ctx.config.password)?;

    let user = ctx
        .database
        .create_user(CreateUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash: Some(hash_password(password)?),
            role: GlobalRole::Admin,
        })
        .await?;

    ctx.logger()
        .info(&format!("Created bootstrap admin {}", user.id));
    Ok(user)
}

//! Shared helpers for plugin implementations.

use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::rbac::{self, Action, ClubScope, GlobalRole, Grant, Resource};
use clubhub_core::types::{Club, Event, ListUsersParams, Membership, MembershipStatus};
use clubhub_core::{HubContext, HubError, HubRequest, HubResult, Session, User};

/// Authenticated user and session for the request's bearer token.
pub async fn require_session<DB: DatabaseAdapter>(
    req: &HubRequest,
    ctx: &HubContext<DB>,
) -> HubResult<(User, Session)> {
    let (session, user) = ctx.session_manager().require(req).await?;
    Ok((user, session))
}

/// The caller if a valid bearer token was sent; anonymous otherwise.
pub async fn optional_user<DB: DatabaseAdapter>(
    req: &HubRequest,
    ctx: &HubContext<DB>,
) -> HubResult<Option<User>> {
    Ok(ctx
        .session_manager()
        .authenticate(req)
        .await?
        .map(|(_, user)| user))
}

pub fn require_admin(user: &User) -> HubResult<()> {
    rbac::require_global_role(user, &[GlobalRole::Admin])
}

/// Deserialize string query parameters into `T`, falling back to defaults.
pub fn parse_query<T: Default + serde::de::DeserializeOwned>(query: &HashMap<String, String>) -> T {
    let json_value =
        serde_json::to_value(query).unwrap_or(serde_json::Value::Object(Default::default()));
    serde_json::from_value(json_value).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

/// Read `limit`/`offset` query parameters. `limit` is capped at `max`.
pub fn page(query: &HashMap<String, String>, default_limit: usize, max: usize) -> HubResult<Page> {
    let limit = parse_usize(query, "limit")?.unwrap_or(default_limit).min(max);
    let offset = parse_usize(query, "offset")?.unwrap_or(0);
    Ok(Page { limit, offset })
}

fn parse_usize(query: &HashMap<String, String>, name: &str) -> HubResult<Option<usize>> {
    query
        .get(name)
        .map(|raw| {
            raw.trim()
                .parse::<usize>()
                .map_err(|_| {
                    HubError::bad_request(format!("{} must be a non-negative integer", name))
                })
        })
        .transpose()
}

pub fn query_flag(query: &HashMap<String, String>, name: &str) -> bool {
    query
        .get(name)
        .is_some_and(|v| matches!(v.as_str(), "true" | "1"))
}

/// Parse an enum from its wire name (e.g. `pending_archive`).
pub fn parse_wire<T: DeserializeOwned>(raw: &str, field: &str) -> HubResult<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .map_err(|_| HubError::bad_request(format!("Invalid {}: {}", field, raw)))
}

/// Required string query parameter.
pub fn require_query<'a>(query: &'a HashMap<String, String>, name: &str) -> HubResult<&'a str> {
    query
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HubError::bad_request(format!("{} is required", name)))
}

pub const CLUB_CACHE_PREFIX: &str = "club:";

/// Read a cached JSON value. Cache failures are logged and read as a miss.
pub async fn cache_get<DB: DatabaseAdapter, T: DeserializeOwned>(
    ctx: &HubContext<DB>,
    key: &str,
) -> Option<T> {
    match ctx.cache.get(key).await {
        Ok(Some(raw)) => serde_json::from_str(&raw).ok(),
        Ok(None) => None,
        Err(e) => {
            ctx.logger().warn(&format!("Cache read failed for {}: {}", key, e));
            None
        }
    }
}

pub async fn cache_put<DB: DatabaseAdapter, T: Serialize>(
    ctx: &HubContext<DB>,
    key: &str,
    value: &T,
) {
    let stored = match serde_json::to_string(value) {
        Ok(raw) => ctx.cache.set(key, &raw, ctx.config.cache_ttl).await,
        Err(e) => Err(e.into()),
    };
    if let Err(e) = stored {
        ctx.logger().warn(&format!("Cache write failed for {}: {}", key, e));
    }
}

/// Drop every cached club listing and detail.
pub async fn invalidate_club_cache<DB: DatabaseAdapter>(ctx: &HubContext<DB>) {
    if let Err(e) = ctx.cache.delete_prefix(CLUB_CACHE_PREFIX).await {
        ctx.logger().warn(&format!("Cache invalidation failed: {}", e));
    }
}

pub async fn load_club<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    club_id: &str,
) -> HubResult<Club> {
    ctx.database
        .get_club_by_id(club_id)
        .await?
        .ok_or_else(|| HubError::not_found("Club not found"))
}

pub async fn load_event<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    event_id: &str,
) -> HubResult<Event> {
    ctx.database
        .get_event_by_id(event_id)
        .await?
        .ok_or_else(|| HubError::not_found("Event not found"))
}

pub async fn load_membership<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    membership_id: &str,
) -> HubResult<Membership> {
    ctx.database
        .get_membership_by_id(membership_id)
        .await?
        .ok_or_else(|| HubError::not_found("Membership not found"))
}

/// The user's pending or approved membership in `club_id`.
pub async fn membership_in<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    club_id: &str,
    user_id: &str,
) -> HubResult<Option<Membership>> {
    ctx.database.get_active_membership(club_id, user_id).await
}

/// Check a club-scoped permission for `user`, loading their membership.
pub async fn require_club_permission<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user: &User,
    club: &Club,
    resource: Resource,
    action: Action,
) -> HubResult<Grant> {
    let membership = membership_in(ctx, &club.id, &user.id).await?;
    rbac::require(
        user,
        Some(ClubScope::new(club, membership.as_ref())),
        resource,
        action,
    )
}

/// Whether `user` may read `club`'s internal data (members, drafts).
pub async fn can_view_internal<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    user: Option<&User>,
    club: &Club,
) -> HubResult<bool> {
    let Some(user) = user else {
        return Ok(false);
    };
    let membership = membership_in(ctx, &club.id, &user.id).await?;
    Ok(rbac::evaluate(
        user,
        Some(ClubScope::new(club, membership.as_ref())),
        Resource::Event,
        Action::Read,
    )
    .allowed)
}

/// User ids holding president or vice-president in the club.
pub async fn leadership_ids<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    club_id: &str,
) -> HubResult<Vec<String>> {
    Ok(ctx
        .database
        .list_club_memberships(club_id, Some(MembershipStatus::Approved))
        .await?
        .into_iter()
        .filter(|m| m.role.is_leadership())
        .map(|m| m.user_id)
        .collect())
}

pub async fn admin_ids<DB: DatabaseAdapter>(ctx: &HubContext<DB>) -> HubResult<Vec<String>> {
    let (admins, _) = ctx
        .database
        .list_users(ListUsersParams {
            role: Some(GlobalRole::Admin),
            limit: Some(usize::MAX),
            offset: None,
        })
        .await?;
    Ok(admins.into_iter().map(|u| u.id).collect())
}

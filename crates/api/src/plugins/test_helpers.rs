//! Fixtures shared by the plugin test modules.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use clubhub_core::adapters::{
    ClubOps, EventOps, MembershipOps, MemoryDatabaseAdapter, SessionOps, UserOps,
};
use clubhub_core::types::{
    CreateClub, CreateEvent, CreateMembership, CreateSession, CreateUser, StatusChange,
};
use clubhub_core::{
    Club, ClubCategory, ClubRole, Event, EventStatus, GlobalRole, HttpMethod, HubConfig,
    HubContext, HubRequest, HubResponse, Membership, MembershipStatus, Session, User,
};

pub fn create_test_context() -> HubContext<MemoryDatabaseAdapter> {
    create_test_context_with_config(HubConfig::default())
}

pub fn create_test_context_with_config(config: HubConfig) -> HubContext<MemoryDatabaseAdapter> {
    HubContext::new(Arc::new(config), Arc::new(MemoryDatabaseAdapter::new()))
}

pub async fn create_user(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    name: &str,
    role: GlobalRole,
) -> User {
    ctx.database
        .create_user(CreateUser {
            name: name.to_string(),
            email: format!("{}@campus.edu", name.to_lowercase()),
            password_hash: None,
            role,
        })
        .await
        .unwrap()
}

pub async fn create_session(ctx: &HubContext<MemoryDatabaseAdapter>, user: &User) -> Session {
    ctx.database
        .create_session(CreateSession {
            user_id: user.id.clone(),
            expires_at: Utc::now() + Duration::hours(24),
        })
        .await
        .unwrap()
}

/// A user plus a live session token.
pub async fn signed_in(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    name: &str,
    role: GlobalRole,
) -> (User, String) {
    let user = create_user(ctx, name, role).await;
    let session = create_session(ctx, &user).await;
    (user, session.token)
}

pub async fn create_club(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    name: &str,
    coordinator: &User,
) -> Club {
    ctx.database
        .create_club(CreateClub {
            name: name.to_string(),
            category: ClubCategory::Technical,
            description: format!("{} club", name),
            coordinator_id: coordinator.id.clone(),
        })
        .await
        .unwrap()
}

/// Insert a membership directly in the given status.
pub async fn add_membership(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    club: &Club,
    user: &User,
    role: ClubRole,
    status: MembershipStatus,
) -> Membership {
    ctx.database
        .create_membership(CreateMembership {
            user_id: user.id.clone(),
            club_id: club.id.clone(),
            role,
            status,
            message: None,
        })
        .await
        .unwrap()
}

pub async fn add_member(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    club: &Club,
    user: &User,
    role: ClubRole,
) -> Membership {
    add_membership(ctx, club, user, role, MembershipStatus::Approved).await
}

/// A draft event starting `starts_in` from now and lasting two hours.
pub async fn create_event(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    club: &Club,
    creator: &User,
    starts_in: Duration,
    budget: u64,
) -> Event {
    let start = Utc::now() + starts_in;
    ctx.database
        .create_event(CreateEvent {
            club_id: club.id.clone(),
            participating_club_ids: Vec::new(),
            title: "Open Day".to_string(),
            description: "Club open day".to_string(),
            venue: "Auditorium".to_string(),
            start_at: start,
            end_at: start + Duration::hours(2),
            budget,
            expected_attendance: Some(100),
            created_by: creator.id.clone(),
        })
        .await
        .unwrap()
}

/// Force an event into `status`, bypassing the lifecycle rules.
pub async fn force_status(
    ctx: &HubContext<MemoryDatabaseAdapter>,
    event: &Event,
    status: EventStatus,
) -> Event {
    let current = ctx.database.get_event_by_id(&event.id).await.unwrap().unwrap();
    ctx.database
        .transition_event(&event.id, current.status, StatusChange::to(status))
        .await
        .unwrap()
        .unwrap()
}

pub fn json_request(
    method: HttpMethod,
    path: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> HubRequest {
    let mut headers = HashMap::new();
    headers.insert("content-type".to_string(), "application/json".to_string());
    if let Some(token) = token {
        headers.insert("authorization".to_string(), format!("Bearer {}", token));
    }
    HubRequest::from_parts(
        method,
        path.to_string(),
        headers,
        body.map(|b| serde_json::to_vec(&b).unwrap()),
        HashMap::new(),
    )
}

pub fn post(path: &str, token: &str, body: serde_json::Value) -> HubRequest {
    json_request(HttpMethod::Post, path, Some(token), Some(body))
}

pub fn get(path: &str, token: Option<&str>, query: &[(&str, &str)]) -> HubRequest {
    let mut req = json_request(HttpMethod::Get, path, token, None);
    req.query = query
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    req
}

pub fn json_body(resp: &HubResponse) -> serde_json::Value {
    serde_json::from_slice(&resp.body).unwrap()
}

//! Shared test harness for the ClubHub integration tests.
//!
//! Provides:
//! - [`TestHarness`]: wrapper around `Hub` with request builders, response
//!   parsing and helpers to seed users, clubs and events over HTTP.
//! - [`unique_email`]: counter-based email generator.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use clubhub::adapters::{MemoryDatabaseAdapter, UserOps};
use clubhub::types::UpdateUser;
use clubhub::{GlobalRole, Hub, HubConfig, HubRequest, HttpMethod, RateLimitConfig};
use serde_json::{Value, json};

static EMAIL_COUNTER: AtomicU64 = AtomicU64::new(0);

#[allow(dead_code)]
pub fn unique_email(prefix: &str) -> String {
    let n = EMAIL_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}_{n}@campus.edu")
}

/// A signed-in user.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub token: String,
}

#[allow(dead_code)]
pub struct TestHarness {
    hub: Arc<Hub<MemoryDatabaseAdapter>>,
}

#[allow(dead_code)]
impl TestHarness {
    /// Default configuration with rate limiting off.
    pub async fn new() -> Self {
        Self::with_config(HubConfig::new()).await
    }

    pub async fn with_config(config: HubConfig) -> Self {
        let hub = Hub::<MemoryDatabaseAdapter>::new(config)
            .database(MemoryDatabaseAdapter::new())
            .rate_limit(RateLimitConfig::default().enabled(false))
            .default_plugins()
            .build()
            .await
            .expect("Failed to build test hub");
        Self { hub: Arc::new(hub) }
    }

    pub fn hub(&self) -> &Hub<MemoryDatabaseAdapter> {
        &self.hub
    }

    pub fn arc(&self) -> Arc<Hub<MemoryDatabaseAdapter>> {
        self.hub.clone()
    }

    // -------------------------------------------------------------------
    // Requests
    // -------------------------------------------------------------------

    pub fn get(&self, path: &str, token: Option<&str>, query: &[(&str, &str)]) -> HubRequest {
        let mut req = HubRequest::new(HttpMethod::Get, path);
        req.query = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        if let Some(token) = token {
            req.headers
                .insert("authorization".to_string(), format!("Bearer {token}"));
        }
        req
    }

    pub fn post(&self, path: &str, token: Option<&str>, body: Value) -> HubRequest {
        let mut req = HubRequest::new(HttpMethod::Post, path);
        req.body = Some(body.to_string().into_bytes());
        req.headers
            .insert("content-type".to_string(), "application/json".to_string());
        if let Some(token) = token {
            req.headers
                .insert("authorization".to_string(), format!("Bearer {token}"));
        }
        req
    }

    /// Send a request and return `(status_code, parsed_json_body)`.
    pub async fn send(&self, req: HubRequest) -> (u16, Value) {
        let resp = self.hub.handle_request(req).await;
        let json = serde_json::from_slice(&resp.body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&resp.body).to_string()));
        (resp.status, json)
    }

    /// POST and assert a 200, returning the body.
    pub async fn ok_post(&self, path: &str, token: &str, body: Value) -> Value {
        let (status, json) = self.send(self.post(path, Some(token), body)).await;
        assert_eq!(status, 200, "POST {path} failed with {status}: {json}");
        json
    }

    /// GET and assert a 200, returning the body.
    pub async fn ok_get(&self, path: &str, token: &str, query: &[(&str, &str)]) -> Value {
        let (status, json) = self.send(self.get(path, Some(token), query)).await;
        assert_eq!(status, 200, "GET {path} failed with {status}: {json}");
        json
    }

    // -------------------------------------------------------------------
    // Seeding
    // -------------------------------------------------------------------

    /// Sign up a student with a unique email.
    pub async fn student(&self, name: &str) -> Account {
        let email = unique_email(&name.to_lowercase());
        let (status, json) = self
            .send(self.post(
                "/sign-up",
                None,
                json!({ "name": name, "email": email, "password": "password123" }),
            ))
            .await;
        assert_eq!(status, 200, "sign-up failed with {status}: {json}");
        Account {
            id: json["user"]["id"].as_str().expect("missing user id").to_string(),
            token: json["token"].as_str().expect("missing token").to_string(),
        }
    }

    /// Sign up a user and set their institution role directly in the store.
    pub async fn user_with_role(&self, name: &str, role: GlobalRole) -> Account {
        let account = self.student(name).await;
        if role != GlobalRole::Student {
            self.hub
                .database()
                .update_user(
                    &account.id,
                    UpdateUser {
                        role: Some(role),
                        ..Default::default()
                    },
                )
                .await
                .expect("Failed to set role");
        }
        account
    }

    pub async fn admin(&self) -> Account {
        self.user_with_role("Admin", GlobalRole::Admin).await
    }

    pub async fn coordinator(&self, name: &str) -> Account {
        self.user_with_role(name, GlobalRole::Coordinator).await
    }

    /// Create a club as `admin` and return its id.
    pub async fn club(&self, admin: &Account, name: &str, coordinator: &Account) -> String {
        let body = self
            .ok_post(
                "/club/create",
                &admin.token,
                json!({
                    "name": name,
                    "category": "technical",
                    "description": format!("The {name} club"),
                    "coordinatorId": coordinator.id,
                }),
            )
            .await;
        body["club"]["id"].as_str().expect("missing club id").to_string()
    }

    /// Apply to a club and have `approver` accept. Returns the membership id.
    pub async fn join(&self, member: &Account, club_id: &str, approver: &Account) -> String {
        let body = self
            .ok_post("/membership/apply", &member.token, json!({ "clubId": club_id }))
            .await;
        let membership_id = body["membership"]["id"]
            .as_str()
            .expect("missing membership id")
            .to_string();
        self.ok_post(
            "/membership/approve",
            &approver.token,
            json!({ "membershipId": membership_id }),
        )
        .await;
        membership_id
    }

    /// Join and then receive `role` from `granter`.
    pub async fn join_as(
        &self,
        member: &Account,
        club_id: &str,
        role: &str,
        granter: &Account,
    ) -> String {
        let membership_id = self.join(member, club_id, granter).await;
        self.ok_post(
            "/membership/update-role",
            &granter.token,
            json!({ "membershipId": membership_id, "role": role }),
        )
        .await;
        membership_id
    }

    /// Draft an event starting `starts_in` from now. Returns its id.
    pub async fn draft_event(
        &self,
        organiser: &Account,
        club_id: &str,
        starts_in: Duration,
        budget: u64,
    ) -> String {
        let start: DateTime<Utc> = Utc::now() + starts_in;
        let body = self
            .ok_post(
                "/event/create",
                &organiser.token,
                json!({
                    "clubId": club_id,
                    "title": "Hack Night",
                    "description": "Build something",
                    "venue": "Lab 3",
                    "startAt": start,
                    "endAt": start + Duration::hours(3),
                    "budget": budget,
                }),
            )
            .await;
        body["event"]["id"].as_str().expect("missing event id").to_string()
    }

    pub async fn event_status(&self, token: &str, event_id: &str) -> String {
        let body = self
            .ok_get("/event/get", token, &[("eventId", event_id)])
            .await;
        body["event"]["status"]
            .as_str()
            .expect("missing status")
            .to_string()
    }
}

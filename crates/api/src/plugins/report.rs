use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::rbac::{Action, Resource};
use clubhub_core::types::{EventFilter, ListUsersParams};
use clubhub_core::{ClubRole, ClubStatus, Event, EventStatus, GlobalRole, MembershipStatus};
use clubhub_core::{HttpMethod, HubRequest, HubResponse};
use clubhub_core::{HubContext, HubPlugin, HubRoute};
use clubhub_core::{HubError, HubResult};

use super::helpers::{
    load_club, require_admin, require_club_permission, require_query, require_session,
};

/// JSON activity reports for a single club and for the whole institution.
pub struct ReportPlugin;

#[derive(Debug, Serialize)]
struct ClubReport {
    #[serde(rename = "clubId")]
    club_id: String,
    #[serde(rename = "clubName")]
    club_name: String,
    #[serde(rename = "membersByRole")]
    members_by_role: BTreeMap<&'static str, usize>,
    #[serde(rename = "totalMembers")]
    total_members: usize,
    #[serde(rename = "pendingApplications")]
    pending_applications: usize,
    #[serde(rename = "eventsByStatus")]
    events_by_status: BTreeMap<&'static str, usize>,
    /// `completed / (completed + incomplete)`; absent until an event closes.
    #[serde(rename = "completionRate")]
    completion_rate: Option<f64>,
    #[serde(rename = "approvedBudget")]
    approved_budget: u64,
}

#[derive(Debug, Serialize)]
struct OverviewReport {
    #[serde(rename = "clubsByStatus")]
    clubs_by_status: BTreeMap<&'static str, usize>,
    #[serde(rename = "usersByRole")]
    users_by_role: BTreeMap<&'static str, usize>,
    #[serde(rename = "eventsByStatus")]
    events_by_status: BTreeMap<&'static str, usize>,
}

fn zeroed<K: Ord>(keys: impl IntoIterator<Item = K>) -> BTreeMap<K, usize> {
    keys.into_iter().map(|k| (k, 0)).collect()
}

fn events_by_status(events: &[Event]) -> BTreeMap<&'static str, usize> {
    let mut counts = zeroed(EventStatus::ALL.iter().map(|s| s.as_str()));
    for event in events {
        *counts.entry(event.status.as_str()).or_default() += 1;
    }
    counts
}

/// Whether the event made it through the approval chain.
fn was_approved(status: EventStatus) -> bool {
    matches!(
        status,
        EventStatus::Published
            | EventStatus::Ongoing
            | EventStatus::PendingCompletion
            | EventStatus::Completed
            | EventStatus::Incomplete
    )
}

fn completion_rate(events: &[Event]) -> Option<f64> {
    let completed = events
        .iter()
        .filter(|e| e.status == EventStatus::Completed)
        .count();
    let incomplete = events
        .iter()
        .filter(|e| e.status == EventStatus::Incomplete)
        .count();
    let closed = completed + incomplete;
    (closed > 0).then(|| completed as f64 / closed as f64)
}

impl ReportPlugin {
    pub fn new() -> Self {
        Self
    }

    async fn handle_club<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let club = load_club(ctx, require_query(&req.query, "clubId")?).await?;
        require_club_permission(ctx, &user, &club, Resource::Report, Action::Read).await?;

        let members = ctx
            .database
            .list_club_memberships(&club.id, Some(MembershipStatus::Approved))
            .await?;
        let mut members_by_role = zeroed(ClubRole::ALL.iter().map(|r| r.as_str()));
        for membership in &members {
            *members_by_role.entry(membership.role.as_str()).or_default() += 1;
        }

        let pending_applications = ctx
            .database
            .list_club_memberships(&club.id, Some(MembershipStatus::Pending))
            .await?
            .len();

        // Only events the club hosts count towards its figures
        let events: Vec<Event> = ctx
            .database
            .list_events(EventFilter {
                club_id: Some(club.id.clone()),
                statuses: None,
            })
            .await?
            .into_iter()
            .filter(|e| e.club_id == club.id)
            .collect();

        let report = ClubReport {
            club_id: club.id,
            club_name: club.name,
            members_by_role,
            total_members: members.len(),
            pending_applications,
            events_by_status: events_by_status(&events),
            completion_rate: completion_rate(&events),
            approved_budget: events
                .iter()
                .filter(|e| was_approved(e.status))
                .map(|e| e.budget)
                .sum(),
        };

        HubResponse::json(200, &report).map_err(HubError::from)
    }

    async fn handle_overview<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        require_admin(&user)?;

        let mut clubs_by_status = zeroed(
            [ClubStatus::Active, ClubStatus::PendingArchive, ClubStatus::Archived]
                .iter()
                .map(|s| s.as_str()),
        );
        for club in ctx.database.list_clubs(None).await? {
            *clubs_by_status.entry(club.status.as_str()).or_default() += 1;
        }

        let mut users_by_role = zeroed(
            [GlobalRole::Student, GlobalRole::Coordinator, GlobalRole::Admin]
                .iter()
                .map(|r| r.as_str()),
        );
        let (users, _) = ctx
            .database
            .list_users(ListUsersParams {
                limit: Some(usize::MAX),
                ..Default::default()
            })
            .await?;
        for user in &users {
            *users_by_role.entry(user.role.as_str()).or_default() += 1;
        }

        let events = ctx.database.list_events(EventFilter::default()).await?;

        let report = OverviewReport {
            clubs_by_status,
            users_by_role,
            events_by_status: events_by_status(&events),
        };
        HubResponse::json(200, &report).map_err(HubError::from)
    }
}

impl Default for ReportPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for ReportPlugin {
    fn name(&self) -> &'static str {
        "report"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::get("/report/club", "club_report"),
            HubRoute::get("/report/overview", "overview_report"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Get, "/report/club") => Ok(Some(self.handle_club(req, ctx).await?)),
            (HttpMethod::Get, "/report/overview") => {
                Ok(Some(self.handle_overview(req, ctx).await?))
            }
            _ => Ok(None),
        }
    }
}

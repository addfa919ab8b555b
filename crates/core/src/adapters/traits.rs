use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::HubResult;
use crate::lifecycle::{CompletionChecklist, EventStatus};
use crate::types::{
    AuditLog, AuditLogQuery, Club, ClubStatus, CreateAuditLog, CreateClub, CreateEvent,
    CreateMembership, CreateNotification, CreateSession, CreateUser, Event, EventFilter,
    ListUsersParams, Membership, MembershipStatus, Notification, NotificationKind, Session,
    StatusChange, UpdateClub, UpdateEvent, UpdateMembership, UpdateUser, User,
};

/// User persistence operations.
#[async_trait]
pub trait UserOps: Send + Sync + 'static {
    /// Emails are unique case-insensitively; a duplicate is a `Conflict`.
    async fn create_user(&self, user: CreateUser) -> HubResult<User>;
    async fn get_user_by_id(&self, id: &str) -> HubResult<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> HubResult<Option<User>>;
    async fn update_user(&self, id: &str, update: UpdateUser) -> HubResult<User>;
    /// Returns the page and the total number of matching users.
    async fn list_users(&self, params: ListUsersParams) -> HubResult<(Vec<User>, usize)>;
}

/// Session persistence operations.
#[async_trait]
pub trait SessionOps: Send + Sync + 'static {
    async fn create_session(&self, session: CreateSession) -> HubResult<Session>;
    async fn get_session(&self, token: &str) -> HubResult<Option<Session>>;
    async fn update_session_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> HubResult<()>;
    async fn delete_session(&self, token: &str) -> HubResult<()>;
    async fn delete_user_sessions(&self, user_id: &str) -> HubResult<()>;
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> HubResult<usize>;
}

/// Club persistence operations.
#[async_trait]
pub trait ClubOps: Send + Sync + 'static {
    /// Names are unique case-insensitively; a duplicate is a `Conflict`.
    async fn create_club(&self, club: CreateClub) -> HubResult<Club>;
    async fn get_club_by_id(&self, id: &str) -> HubResult<Option<Club>>;
    async fn get_club_by_name(&self, name: &str) -> HubResult<Option<Club>>;
    async fn update_club(&self, id: &str, update: UpdateClub) -> HubResult<Club>;
    async fn list_clubs(&self, status: Option<ClubStatus>) -> HubResult<Vec<Club>>;
    async fn list_coordinated_clubs(&self, coordinator_id: &str) -> HubResult<Vec<Club>>;
}

/// Club membership persistence operations.
#[async_trait]
pub trait MembershipOps: Send + Sync + 'static {
    async fn create_membership(&self, membership: CreateMembership) -> HubResult<Membership>;
    async fn get_membership_by_id(&self, id: &str) -> HubResult<Option<Membership>>;
    /// The user's pending or approved membership in the club.
    async fn get_active_membership(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> HubResult<Option<Membership>>;
    async fn update_membership(&self, id: &str, update: UpdateMembership) -> HubResult<Membership>;
    async fn delete_membership(&self, id: &str) -> HubResult<()>;
    async fn list_club_memberships(
        &self,
        club_id: &str,
        status: Option<MembershipStatus>,
    ) -> HubResult<Vec<Membership>>;
    async fn list_user_memberships(
        &self,
        user_id: &str,
        status: Option<MembershipStatus>,
    ) -> HubResult<Vec<Membership>>;
}

/// Event persistence operations.
#[async_trait]
pub trait EventOps: Send + Sync + 'static {
    async fn create_event(&self, event: CreateEvent) -> HubResult<Event>;
    async fn get_event_by_id(&self, id: &str) -> HubResult<Option<Event>>;
    async fn update_event(&self, id: &str, update: UpdateEvent) -> HubResult<Event>;
    async fn delete_event(&self, id: &str) -> HubResult<()>;
    async fn list_events(&self, filter: EventFilter) -> HubResult<Vec<Event>>;

    /// Apply `change` only if the event is still in `expected`.
    ///
    /// Returns `None` when the event is missing or its status moved on.
    async fn transition_event(
        &self,
        id: &str,
        expected: EventStatus,
        change: StatusChange,
    ) -> HubResult<Option<Event>>;

    async fn update_event_checklist(
        &self,
        id: &str,
        checklist: CompletionChecklist,
    ) -> HubResult<Event>;

    /// Published events whose start time has passed.
    async fn events_due_to_start(&self, now: DateTime<Utc>) -> HubResult<Vec<Event>>;
    /// Ongoing events whose end time has passed.
    async fn events_due_to_end(&self, now: DateTime<Utc>) -> HubResult<Vec<Event>>;
    /// Events awaiting completion artifacts.
    async fn events_pending_completion(&self) -> HubResult<Vec<Event>>;
}

/// Notification persistence operations.
#[async_trait]
pub trait NotificationOps: Send + Sync + 'static {
    async fn create_notification(&self, notification: CreateNotification)
    -> HubResult<Notification>;
    /// Latest notification of `kind` for the user created at or after `since`.
    async fn find_recent_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> HubResult<Option<Notification>>;
    async fn list_user_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
        offset: usize,
    ) -> HubResult<Vec<Notification>>;
    async fn mark_notification_read(
        &self,
        user_id: &str,
        id: &str,
    ) -> HubResult<Option<Notification>>;
    async fn mark_all_notifications_read(&self, user_id: &str) -> HubResult<usize>;
    async fn count_unread_notifications(&self, user_id: &str) -> HubResult<usize>;
}

/// Audit log persistence operations. Records are never updated.
#[async_trait]
pub trait AuditOps: Send + Sync + 'static {
    async fn append_audit_log(&self, entry: CreateAuditLog) -> HubResult<AuditLog>;
    async fn list_audit_logs(&self, query: AuditLogQuery) -> HubResult<Vec<AuditLog>>;
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::lifecycle::{CompletionChecklist, EventStatus};
use crate::rbac::{ClubRole, GlobalRole};

/// A person with an account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    // Never leaves the store
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub role: GlobalRole,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Bearer-token session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClubCategory {
    Technical,
    Cultural,
    Sports,
    Literary,
    Social,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubStatus {
    Active,
    PendingArchive,
    Archived,
}

impl ClubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::PendingArchive => "pending_archive",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ClubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub category: ClubCategory,
    pub description: String,
    #[serde(rename = "coordinatorId")]
    pub coordinator_id: String,
    pub status: ClubStatus,
    #[serde(rename = "archiveReason")]
    pub archive_reason: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Club {
    pub fn is_active(&self) -> bool {
        self.status == ClubStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Approved,
    Rejected,
}

/// A user's standing in one club.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Membership {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "clubId")]
    pub club_id: String,
    pub role: ClubRole,
    pub status: MembershipStatus,
    pub message: Option<String>,
    #[serde(rename = "decisionReason")]
    pub decision_reason: Option<String>,
    #[serde(rename = "decidedBy")]
    pub decided_by: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_approved(&self) -> bool {
        self.status == MembershipStatus::Approved
    }
}

/// Sign-off recorded by an approval stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Approval {
    pub by: String,
    pub at: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: String,
    #[serde(rename = "clubId")]
    pub club_id: String,
    #[serde(rename = "participatingClubIds")]
    pub participating_club_ids: Vec<String>,
    pub title: String,
    pub description: String,
    pub venue: String,
    #[serde(rename = "startAt")]
    pub start_at: DateTime<Utc>,
    #[serde(rename = "endAt")]
    pub end_at: DateTime<Utc>,
    pub budget: u64,
    #[serde(rename = "expectedAttendance")]
    pub expected_attendance: Option<u32>,
    pub status: EventStatus,
    #[serde(rename = "coordinatorApproval")]
    pub coordinator_approval: Option<Approval>,
    #[serde(rename = "adminApproval")]
    pub admin_approval: Option<Approval>,
    #[serde(rename = "rejectionReason")]
    pub rejection_reason: Option<String>,
    pub checklist: CompletionChecklist,
    #[serde(rename = "completionDeadline")]
    pub completion_deadline: Option<DateTime<Utc>>,
    #[serde(rename = "createdBy")]
    pub created_by: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    MembershipApplied,
    MembershipApproved,
    MembershipRejected,
    RoleChanged,
    MemberRemoved,
    EventSubmitted,
    EventApproved,
    EventRejected,
    EventPublished,
    EventStarted,
    CompletionDue,
    CompletionReminder,
    EventCompleted,
    EventIncomplete,
    ClubArchiveRequested,
    ClubArchived,
    ClubCreated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Append-only audit record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLog {
    pub id: String,
    #[serde(rename = "actorId")]
    pub actor_id: String,
    pub action: String,
    #[serde(rename = "targetType")]
    pub target_type: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "clubId")]
    pub club_id: Option<String>,
    pub details: serde_json::Value,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// User creation data
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: GlobalRole,
}

/// User update data
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub role: Option<GlobalRole>,
    pub password_hash: Option<String>,
}

/// Session creation data
#[derive(Debug, Clone)]
pub struct CreateSession {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateClub {
    pub name: String,
    pub category: ClubCategory,
    pub description: String,
    pub coordinator_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateClub {
    pub name: Option<String>,
    pub category: Option<ClubCategory>,
    pub description: Option<String>,
    pub coordinator_id: Option<String>,
    pub status: Option<ClubStatus>,
    /// `Some(None)` clears the reason.
    pub archive_reason: Option<Option<String>>,
}

#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub user_id: String,
    pub club_id: String,
    pub role: ClubRole,
    pub status: MembershipStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateMembership {
    pub role: Option<ClubRole>,
    pub status: Option<MembershipStatus>,
    pub decision_reason: Option<String>,
    pub decided_by: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateEvent {
    pub club_id: String,
    pub participating_club_ids: Vec<String>,
    pub title: String,
    pub description: String,
    pub venue: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub budget: u64,
    pub expected_attendance: Option<u32>,
    pub created_by: String,
}

/// Editable event fields; only applied to drafts.
#[derive(Debug, Clone, Default)]
pub struct UpdateEvent {
    pub participating_club_ids: Option<Vec<String>>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub budget: Option<u64>,
    pub expected_attendance: Option<u32>,
}

/// Side effects written together with a status change.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub to: EventStatus,
    pub coordinator_approval: Option<Approval>,
    pub admin_approval: Option<Approval>,
    pub rejection_reason: Option<String>,
    pub completion_deadline: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn to(status: EventStatus) -> Self {
        Self {
            to: status,
            coordinator_approval: None,
            admin_approval: None,
            rejection_reason: None,
            completion_deadline: None,
        }
    }

    pub fn coordinator_approval(mut self, approval: Approval) -> Self {
        self.coordinator_approval = Some(approval);
        self
    }

    pub fn admin_approval(mut self, approval: Approval) -> Self {
        self.admin_approval = Some(approval);
        self
    }

    pub fn rejection_reason(mut self, reason: impl Into<String>) -> Self {
        self.rejection_reason = Some(reason.into());
        self
    }

    pub fn completion_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.completion_deadline = Some(deadline);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub club_id: Option<String>,
    pub statuses: Option<Vec<EventStatus>>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub club_id: Option<String>,
    pub details: serde_json::Value,
}

/// Filter for listing audit records, newest first.
#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub club_id: Option<String>,
    pub actor_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
}

/// Parameters for listing users (admin endpoint).
#[derive(Debug, Clone, Default)]
pub struct ListUsersParams {
    pub role: Option<GlobalRole>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// HTTP method enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

/// Framework-agnostic request
#[derive(Debug, Clone)]
pub struct HubRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
    pub query: HashMap<String, String>,
}

/// Framework-agnostic response
#[derive(Debug, Clone)]
pub struct HubResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HubRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HashMap::new(),
            body: None,
            query: HashMap::new(),
        }
    }

    pub fn from_parts(
        method: HttpMethod,
        path: String,
        headers: HashMap<String, String>,
        body: Option<Vec<u8>>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            method,
            path,
            headers,
            body,
            query,
        }
    }

    pub fn method(&self) -> &HttpMethod {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Header lookup; names are stored lowercase.
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(&name.to_ascii_lowercase())
    }

    pub fn body_as_json<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        if let Some(body) = &self.body {
            serde_json::from_slice(body)
        } else {
            serde_json::from_str("{}")
        }
    }
}

impl HubResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn json<T: Serialize>(status: u16, data: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(data)?;
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn text(status: u16, text: impl Into<String>) -> Self {
        let body = text.into().into_bytes();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        Self {
            status,
            headers,
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Generic `{ ok: bool }` response used by `/ok`.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Generic `{ status: bool }` response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: bool,
}

/// Health-check response for `/health`.
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub service: String,
}

/// Error body `{ message: String }`.
#[derive(Debug, Serialize)]
pub struct ErrorMessageResponse {
    pub message: String,
}

/// Middleware error response `{ code: String, message: String }`.
#[derive(Debug, Serialize)]
pub struct CodeMessageResponse {
    pub code: &'static str,
    pub message: String,
}

/// Rate-limit error response with `retryAfter` field.
#[derive(Debug, Serialize)]
pub struct RateLimitErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
    #[serde(rename = "retryAfter")]
    pub retry_after: u64,
}

/// Validation error response `{ code, message, errors }`.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    pub code: &'static str,
    pub message: &'static str,
    pub errors: HashMap<String, Vec<String>>,
}

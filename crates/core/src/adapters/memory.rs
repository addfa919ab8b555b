use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{HubError, HubResult, StoreError};
use crate::lifecycle::{CompletionChecklist, EventStatus};
use crate::types::{
    AuditLog, AuditLogQuery, Club, ClubStatus, CreateAuditLog, CreateClub, CreateEvent,
    CreateMembership, CreateNotification, CreateSession, CreateUser, Event, EventFilter,
    ListUsersParams, Membership, MembershipStatus, Notification, NotificationKind, Session,
    StatusChange, UpdateClub, UpdateEvent, UpdateMembership, UpdateUser, User,
};

use super::traits::{
    AuditOps, ClubOps, EventOps, MembershipOps, NotificationOps, SessionOps, UserOps,
};

const DEFAULT_USER_PAGE: usize = 100;

/// In-memory store for tests, development and single-node deployments.
///
/// Each collection sits behind its own mutex; operations that must be
/// atomic (unique indexes, status compare-and-set) hold the relevant lock
/// for their whole read-modify-write.
#[derive(Clone, Default)]
pub struct MemoryDatabaseAdapter {
    users: Arc<Mutex<HashMap<String, User>>>,
    email_index: Arc<Mutex<HashMap<String, String>>>,
    sessions: Arc<Mutex<HashMap<String, Session>>>,
    clubs: Arc<Mutex<HashMap<String, Club>>>,
    club_name_index: Arc<Mutex<HashMap<String, String>>>,
    memberships: Arc<Mutex<HashMap<String, Membership>>>,
    events: Arc<Mutex<HashMap<String, Event>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    audit_logs: Arc<Mutex<Vec<AuditLog>>>,
}

impl MemoryDatabaseAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> HubResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Connection("memory store lock poisoned".to_string()).into())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

// ── User operations ──

#[async_trait]
impl UserOps for MemoryDatabaseAdapter {
    async fn create_user(&self, create: CreateUser) -> HubResult<User> {
        let mut users = lock(&self.users)?;
        let mut email_index = lock(&self.email_index)?;

        let email = normalize(&create.email);
        if email_index.contains_key(&email) {
            return Err(HubError::conflict("A user with this email already exists"));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            name: create.name,
            email: email.clone(),
            password_hash: create.password_hash,
            role: create.role,
            created_at: now,
            updated_at: now,
        };

        email_index.insert(email, user.id.clone());
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> HubResult<Option<User>> {
        Ok(lock(&self.users)?.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> HubResult<Option<User>> {
        let users = lock(&self.users)?;
        let email_index = lock(&self.email_index)?;
        Ok(email_index
            .get(&normalize(email))
            .and_then(|id| users.get(id))
            .cloned())
    }

    async fn update_user(&self, id: &str, update: UpdateUser) -> HubResult<User> {
        let mut users = lock(&self.users)?;
        let user = users
            .get_mut(id)
            .ok_or_else(|| HubError::not_found("User not found"))?;

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = Some(hash);
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn list_users(&self, params: ListUsersParams) -> HubResult<(Vec<User>, usize)> {
        let users = lock(&self.users)?;
        let mut matching: Vec<User> = users
            .values()
            .filter(|u| params.role.is_none_or(|role| u.role == role))
            .cloned()
            .collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let total = matching.len();
        let page = matching
            .into_iter()
            .skip(params.offset.unwrap_or(0))
            .take(params.limit.unwrap_or(DEFAULT_USER_PAGE))
            .collect();
        Ok((page, total))
    }
}

// ── Session operations ──

#[async_trait]
impl SessionOps for MemoryDatabaseAdapter {
    async fn create_session(&self, create: CreateSession) -> HubResult<Session> {
        let now = Utc::now();
        let session = Session {
            id: new_id(),
            token: format!("session_{}", Uuid::new_v4()),
            user_id: create.user_id,
            expires_at: create.expires_at,
            created_at: now,
            updated_at: now,
        };

        lock(&self.sessions)?.insert(session.token.clone(), session.clone());
        Ok(session)
    }

    async fn get_session(&self, token: &str) -> HubResult<Option<Session>> {
        Ok(lock(&self.sessions)?.get(token).cloned())
    }

    async fn update_session_expiry(&self, token: &str, expires_at: DateTime<Utc>) -> HubResult<()> {
        if let Some(session) = lock(&self.sessions)?.get_mut(token) {
            session.expires_at = expires_at;
            session.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_session(&self, token: &str) -> HubResult<()> {
        lock(&self.sessions)?.remove(token);
        Ok(())
    }

    async fn delete_user_sessions(&self, user_id: &str) -> HubResult<()> {
        lock(&self.sessions)?.retain(|_, s| s.user_id != user_id);
        Ok(())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> HubResult<usize> {
        let mut sessions = lock(&self.sessions)?;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        Ok(before - sessions.len())
    }
}

// ── Club operations ──

#[async_trait]
impl ClubOps for MemoryDatabaseAdapter {
    async fn create_club(&self, create: CreateClub) -> HubResult<Club> {
        let mut clubs = lock(&self.clubs)?;
        let mut name_index = lock(&self.club_name_index)?;

        let key = normalize(&create.name);
        if name_index.contains_key(&key) {
            return Err(HubError::conflict("A club with this name already exists"));
        }

        let now = Utc::now();
        let club = Club {
            id: new_id(),
            name: create.name.trim().to_string(),
            category: create.category,
            description: create.description,
            coordinator_id: create.coordinator_id,
            status: ClubStatus::Active,
            archive_reason: None,
            created_at: now,
            updated_at: now,
        };

        name_index.insert(key, club.id.clone());
        clubs.insert(club.id.clone(), club.clone());
        Ok(club)
    }

    async fn get_club_by_id(&self, id: &str) -> HubResult<Option<Club>> {
        Ok(lock(&self.clubs)?.get(id).cloned())
    }

    async fn get_club_by_name(&self, name: &str) -> HubResult<Option<Club>> {
        let clubs = lock(&self.clubs)?;
        let name_index = lock(&self.club_name_index)?;
        Ok(name_index
            .get(&normalize(name))
            .and_then(|id| clubs.get(id))
            .cloned())
    }

    async fn update_club(&self, id: &str, update: UpdateClub) -> HubResult<Club> {
        let mut clubs = lock(&self.clubs)?;
        let mut name_index = lock(&self.club_name_index)?;

        let club = clubs
            .get_mut(id)
            .ok_or_else(|| HubError::not_found("Club not found"))?;

        if let Some(name) = update.name {
            let new_key = normalize(&name);
            let old_key = normalize(&club.name);
            if new_key != old_key {
                if name_index.contains_key(&new_key) {
                    return Err(HubError::conflict("A club with this name already exists"));
                }
                name_index.remove(&old_key);
                name_index.insert(new_key, id.to_string());
            }
            club.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            club.category = category;
        }
        if let Some(description) = update.description {
            club.description = description;
        }
        if let Some(coordinator_id) = update.coordinator_id {
            club.coordinator_id = coordinator_id;
        }
        if let Some(status) = update.status {
            club.status = status;
        }
        if let Some(reason) = update.archive_reason {
            club.archive_reason = reason;
        }
        club.updated_at = Utc::now();

        Ok(club.clone())
    }

    async fn list_clubs(&self, status: Option<ClubStatus>) -> HubResult<Vec<Club>> {
        let clubs = lock(&self.clubs)?;
        let mut result: Vec<Club> = clubs
            .values()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect();
        result.sort_by_key(|c| c.name.to_lowercase());
        Ok(result)
    }

    async fn list_coordinated_clubs(&self, coordinator_id: &str) -> HubResult<Vec<Club>> {
        let clubs = lock(&self.clubs)?;
        let mut result: Vec<Club> = clubs
            .values()
            .filter(|c| c.coordinator_id == coordinator_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.name.to_lowercase());
        Ok(result)
    }
}

// ── Membership operations ──

fn sort_memberships(memberships: &mut [Membership]) {
    memberships.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl MembershipOps for MemoryDatabaseAdapter {
    async fn create_membership(&self, create: CreateMembership) -> HubResult<Membership> {
        let mut memberships = lock(&self.memberships)?;

        let duplicate = memberships.values().any(|m| {
            m.user_id == create.user_id
                && m.club_id == create.club_id
                && m.status != MembershipStatus::Rejected
        });
        if duplicate {
            return Err(HubError::conflict(
                "User already has a pending or approved membership in this club",
            ));
        }

        let now = Utc::now();
        let membership = Membership {
            id: new_id(),
            user_id: create.user_id,
            club_id: create.club_id,
            role: create.role,
            status: create.status,
            message: create.message,
            decision_reason: None,
            decided_by: None,
            created_at: now,
            updated_at: now,
        };

        memberships.insert(membership.id.clone(), membership.clone());
        Ok(membership)
    }

    async fn get_membership_by_id(&self, id: &str) -> HubResult<Option<Membership>> {
        Ok(lock(&self.memberships)?.get(id).cloned())
    }

    async fn get_active_membership(
        &self,
        club_id: &str,
        user_id: &str,
    ) -> HubResult<Option<Membership>> {
        Ok(lock(&self.memberships)?
            .values()
            .find(|m| {
                m.club_id == club_id
                    && m.user_id == user_id
                    && m.status != MembershipStatus::Rejected
            })
            .cloned())
    }

    async fn update_membership(&self, id: &str, update: UpdateMembership) -> HubResult<Membership> {
        let mut memberships = lock(&self.memberships)?;
        let membership = memberships
            .get_mut(id)
            .ok_or_else(|| HubError::not_found("Membership not found"))?;

        if let Some(role) = update.role {
            membership.role = role;
        }
        if let Some(status) = update.status {
            membership.status = status;
        }
        if let Some(reason) = update.decision_reason {
            membership.decision_reason = Some(reason);
        }
        if let Some(decided_by) = update.decided_by {
            membership.decided_by = Some(decided_by);
        }
        membership.updated_at = Utc::now();

        Ok(membership.clone())
    }

    async fn delete_membership(&self, id: &str) -> HubResult<()> {
        lock(&self.memberships)?.remove(id);
        Ok(())
    }

    async fn list_club_memberships(
        &self,
        club_id: &str,
        status: Option<MembershipStatus>,
    ) -> HubResult<Vec<Membership>> {
        let mut result: Vec<Membership> = lock(&self.memberships)?
            .values()
            .filter(|m| m.club_id == club_id && status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();
        sort_memberships(&mut result);
        Ok(result)
    }

    async fn list_user_memberships(
        &self,
        user_id: &str,
        status: Option<MembershipStatus>,
    ) -> HubResult<Vec<Membership>> {
        let mut result: Vec<Membership> = lock(&self.memberships)?
            .values()
            .filter(|m| m.user_id == user_id && status.is_none_or(|s| m.status == s))
            .cloned()
            .collect();
        sort_memberships(&mut result);
        Ok(result)
    }
}

// ── Event operations ──

impl MemoryDatabaseAdapter {
    fn events_where(&self, predicate: impl Fn(&Event) -> bool) -> HubResult<Vec<Event>> {
        let mut result: Vec<Event> = lock(&self.events)?
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));
        Ok(result)
    }
}

#[async_trait]
impl EventOps for MemoryDatabaseAdapter {
    async fn create_event(&self, create: CreateEvent) -> HubResult<Event> {
        let now = Utc::now();
        let event = Event {
            id: new_id(),
            club_id: create.club_id,
            participating_club_ids: create.participating_club_ids,
            title: create.title,
            description: create.description,
            venue: create.venue,
            start_at: create.start_at,
            end_at: create.end_at,
            budget: create.budget,
            expected_attendance: create.expected_attendance,
            status: EventStatus::Draft,
            coordinator_approval: None,
            admin_approval: None,
            rejection_reason: None,
            checklist: CompletionChecklist::default(),
            completion_deadline: None,
            created_by: create.created_by,
            created_at: now,
            updated_at: now,
        };

        lock(&self.events)?.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn get_event_by_id(&self, id: &str) -> HubResult<Option<Event>> {
        Ok(lock(&self.events)?.get(id).cloned())
    }

    async fn update_event(&self, id: &str, update: UpdateEvent) -> HubResult<Event> {
        let mut events = lock(&self.events)?;
        let event = events
            .get_mut(id)
            .ok_or_else(|| HubError::not_found("Event not found"))?;

        if let Some(ids) = update.participating_club_ids {
            event.participating_club_ids = ids;
        }
        if let Some(title) = update.title {
            event.title = title;
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(venue) = update.venue {
            event.venue = venue;
        }
        if let Some(start_at) = update.start_at {
            event.start_at = start_at;
        }
        if let Some(end_at) = update.end_at {
            event.end_at = end_at;
        }
        if let Some(budget) = update.budget {
            event.budget = budget;
        }
        if let Some(attendance) = update.expected_attendance {
            event.expected_attendance = Some(attendance);
        }
        event.updated_at = Utc::now();

        Ok(event.clone())
    }

    async fn delete_event(&self, id: &str) -> HubResult<()> {
        lock(&self.events)?.remove(id);
        Ok(())
    }

    async fn list_events(&self, filter: EventFilter) -> HubResult<Vec<Event>> {
        self.events_where(|e| {
            filter
                .club_id
                .as_deref()
                .is_none_or(|club_id| {
                    e.club_id == club_id || e.participating_club_ids.iter().any(|p| p == club_id)
                })
                && filter
                    .statuses
                    .as_ref()
                    .is_none_or(|statuses| statuses.contains(&e.status))
        })
    }

    async fn transition_event(
        &self,
        id: &str,
        expected: EventStatus,
        change: StatusChange,
    ) -> HubResult<Option<Event>> {
        let mut events = lock(&self.events)?;
        let Some(event) = events.get_mut(id) else {
            return Ok(None);
        };
        if event.status != expected {
            return Ok(None);
        }

        event.status = change.to;
        match change.to {
            EventStatus::Draft => {
                event.coordinator_approval = None;
                event.admin_approval = None;
                event.rejection_reason = change.rejection_reason;
            }
            EventStatus::PendingCoordinator => event.rejection_reason = None,
            _ => {}
        }
        if let Some(approval) = change.coordinator_approval {
            event.coordinator_approval = Some(approval);
        }
        if let Some(approval) = change.admin_approval {
            event.admin_approval = Some(approval);
        }
        if let Some(deadline) = change.completion_deadline {
            event.completion_deadline = Some(deadline);
        }
        event.updated_at = Utc::now();

        Ok(Some(event.clone()))
    }

    async fn update_event_checklist(
        &self,
        id: &str,
        checklist: CompletionChecklist,
    ) -> HubResult<Event> {
        let mut events = lock(&self.events)?;
        let event = events
            .get_mut(id)
            .ok_or_else(|| HubError::not_found("Event not found"))?;
        event.checklist = checklist;
        event.updated_at = Utc::now();
        Ok(event.clone())
    }

    async fn events_due_to_start(&self, now: DateTime<Utc>) -> HubResult<Vec<Event>> {
        self.events_where(|e| e.status == EventStatus::Published && e.start_at <= now)
    }

    async fn events_due_to_end(&self, now: DateTime<Utc>) -> HubResult<Vec<Event>> {
        self.events_where(|e| e.status == EventStatus::Ongoing && e.end_at <= now)
    }

    async fn events_pending_completion(&self) -> HubResult<Vec<Event>> {
        self.events_where(|e| e.status == EventStatus::PendingCompletion)
    }
}

// ── Notification operations ──

#[async_trait]
impl NotificationOps for MemoryDatabaseAdapter {
    async fn create_notification(&self, create: CreateNotification) -> HubResult<Notification> {
        let notification = Notification {
            id: new_id(),
            user_id: create.user_id,
            kind: create.kind,
            title: create.title,
            message: create.message,
            link: create.link,
            read: false,
            created_at: Utc::now(),
        };

        lock(&self.notifications)?.push(notification.clone());
        Ok(notification)
    }

    async fn find_recent_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        since: DateTime<Utc>,
    ) -> HubResult<Option<Notification>> {
        Ok(lock(&self.notifications)?
            .iter()
            .rev()
            .find(|n| n.user_id == user_id && n.kind == kind && n.created_at >= since)
            .cloned())
    }

    async fn list_user_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: usize,
        offset: usize,
    ) -> HubResult<Vec<Notification>> {
        Ok(lock(&self.notifications)?
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(
        &self,
        user_id: &str,
        id: &str,
    ) -> HubResult<Option<Notification>> {
        let mut notifications = lock(&self.notifications)?;
        Ok(notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
            .map(|n| {
                n.read = true;
                n.clone()
            }))
    }

    async fn mark_all_notifications_read(&self, user_id: &str) -> HubResult<usize> {
        let mut notifications = lock(&self.notifications)?;
        let mut count = 0;
        for n in notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            n.read = true;
            count += 1;
        }
        Ok(count)
    }

    async fn count_unread_notifications(&self, user_id: &str) -> HubResult<usize> {
        Ok(lock(&self.notifications)?
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count())
    }
}

// ── Audit operations ──

#[async_trait]
impl AuditOps for MemoryDatabaseAdapter {
    async fn append_audit_log(&self, entry: CreateAuditLog) -> HubResult<AuditLog> {
        let log = AuditLog {
            id: new_id(),
            actor_id: entry.actor_id,
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id,
            club_id: entry.club_id,
            details: entry.details,
            created_at: Utc::now(),
        };

        lock(&self.audit_logs)?.push(log.clone());
        Ok(log)
    }

    async fn list_audit_logs(&self, query: AuditLogQuery) -> HubResult<Vec<AuditLog>> {
        Ok(lock(&self.audit_logs)?
            .iter()
            .rev()
            .filter(|log| {
                query
                    .club_id
                    .as_deref()
                    .is_none_or(|club_id| log.club_id.as_deref() == Some(club_id))
                    && query
                        .actor_id
                        .as_deref()
                        .is_none_or(|actor_id| log.actor_id == actor_id)
            })
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::{ClubRole, GlobalRole};
    use crate::types::{Approval, ClubCategory};
    use chrono::Duration;

    fn create_user(email: &str) -> CreateUser {
        CreateUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: None,
            role: GlobalRole::Student,
        }
    }

    fn create_event(club_id: &str) -> CreateEvent {
        let start = Utc::now() + Duration::days(2);
        CreateEvent {
            club_id: club_id.into(),
            participating_club_ids: Vec::new(),
            title: "Workshop".into(),
            description: String::new(),
            venue: "Lab 3".into(),
            start_at: start,
            end_at: start + Duration::hours(2),
            budget: 100,
            expected_attendance: Some(40),
            created_by: "u1".into(),
        }
    }

    #[tokio::test]
    async fn test_user_email_unique_case_insensitive() {
        let db = MemoryDatabaseAdapter::new();
        let user = db.create_user(create_user("Asha@Campus.edu")).await.unwrap();
        assert_eq!(user.email, "asha@campus.edu");

        let err = db.create_user(create_user("asha@campus.EDU")).await.unwrap_err();
        assert_eq!(err.status_code(), 409);

        let found = db.get_user_by_email("ASHA@campus.edu").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn test_club_name_unique() {
        let db = MemoryDatabaseAdapter::new();
        let create = CreateClub {
            name: "Chess Club".into(),
            category: ClubCategory::Other,
            description: String::new(),
            coordinator_id: "coord".into(),
        };
        let club = db.create_club(create.clone()).await.unwrap();
        assert_eq!(club.status, ClubStatus::Active);

        let err = db
            .create_club(CreateClub {
                name: "chess club ".into(),
                ..create
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_one_active_membership_per_club() {
        let db = MemoryDatabaseAdapter::new();
        let create = CreateMembership {
            user_id: "u1".into(),
            club_id: "c1".into(),
            role: ClubRole::Member,
            status: MembershipStatus::Pending,
            message: None,
        };
        let first = db.create_membership(create.clone()).await.unwrap();
        assert!(db.create_membership(create.clone()).await.is_err());

        db.update_membership(
            &first.id,
            UpdateMembership {
                status: Some(MembershipStatus::Rejected),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // A rejected applicant may apply again
        assert!(db.create_membership(create).await.is_ok());
        assert_eq!(db.list_user_memberships("u1", None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let db = MemoryDatabaseAdapter::new();
        let event = db.create_event(create_event("c1")).await.unwrap();

        let submitted = db
            .transition_event(
                &event.id,
                EventStatus::Draft,
                StatusChange::to(EventStatus::PendingCoordinator),
            )
            .await
            .unwrap();
        assert_eq!(submitted.map(|e| e.status), Some(EventStatus::PendingCoordinator));

        // Second attempt from the stale status is a no-op
        let again = db
            .transition_event(
                &event.id,
                EventStatus::Draft,
                StatusChange::to(EventStatus::PendingCoordinator),
            )
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn test_reject_clears_approvals() {
        let db = MemoryDatabaseAdapter::new();
        let event = db.create_event(create_event("c1")).await.unwrap();
        db.transition_event(
            &event.id,
            EventStatus::Draft,
            StatusChange::to(EventStatus::PendingCoordinator),
        )
        .await
        .unwrap();
        let approval = Approval {
            by: "coord".into(),
            at: Utc::now(),
            note: None,
        };
        db.transition_event(
            &event.id,
            EventStatus::PendingCoordinator,
            StatusChange::to(EventStatus::PendingAdmin).coordinator_approval(approval),
        )
        .await
        .unwrap();

        let rejected = db
            .transition_event(
                &event.id,
                EventStatus::PendingAdmin,
                StatusChange::to(EventStatus::Draft).rejection_reason("Budget too high"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.status, EventStatus::Draft);
        assert!(rejected.coordinator_approval.is_none());
        assert_eq!(rejected.rejection_reason.as_deref(), Some("Budget too high"));

        let resubmitted = db
            .transition_event(
                &event.id,
                EventStatus::Draft,
                StatusChange::to(EventStatus::PendingCoordinator),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(resubmitted.rejection_reason.is_none());
    }

    #[tokio::test]
    async fn test_due_queries() {
        let db = MemoryDatabaseAdapter::new();
        let event = db.create_event(create_event("c1")).await.unwrap();
        for (from, to) in [
            (EventStatus::Draft, EventStatus::PendingCoordinator),
            (EventStatus::PendingCoordinator, EventStatus::Published),
        ] {
            db.transition_event(&event.id, from, StatusChange::to(to)).await.unwrap();
        }

        assert!(db.events_due_to_start(Utc::now()).await.unwrap().is_empty());
        let due = db.events_due_to_start(event.start_at).await.unwrap();
        assert_eq!(due.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_sessions_purged() {
        let db = MemoryDatabaseAdapter::new();
        let now = Utc::now();
        db.create_session(CreateSession {
            user_id: "u1".into(),
            expires_at: now - Duration::minutes(1),
        })
        .await
        .unwrap();
        let live = db
            .create_session(CreateSession {
                user_id: "u1".into(),
                expires_at: now + Duration::days(1),
            })
            .await
            .unwrap();

        assert_eq!(db.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(db.get_session(&live.token).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_notifications_newest_first_and_read_flags() {
        let db = MemoryDatabaseAdapter::new();
        for kind in [NotificationKind::EventSubmitted, NotificationKind::EventApproved] {
            db.create_notification(CreateNotification {
                user_id: "u1".into(),
                kind,
                title: "t".into(),
                message: "m".into(),
                link: None,
            })
            .await
            .unwrap();
        }

        let list = db.list_user_notifications("u1", false, 10, 0).await.unwrap();
        assert_eq!(list[0].kind, NotificationKind::EventApproved);

        assert!(db.mark_notification_read("someone-else", &list[0].id).await.unwrap().is_none());
        assert!(db.mark_notification_read("u1", &list[0].id).await.unwrap().is_some());
        assert_eq!(db.count_unread_notifications("u1").await.unwrap(), 1);
        assert_eq!(db.mark_all_notifications_read("u1").await.unwrap(), 1);
        assert_eq!(db.count_unread_notifications("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_audit_log_filters() {
        let db = MemoryDatabaseAdapter::new();
        for (actor, club) in [("a", Some("c1")), ("b", Some("c2")), ("a", None)] {
            db.append_audit_log(CreateAuditLog {
                actor_id: actor.into(),
                action: "club.update".into(),
                target_type: "club".into(),
                target_id: "x".into(),
                club_id: club.map(String::from),
                details: serde_json::json!({}),
            })
            .await
            .unwrap();
        }

        let by_club = db
            .list_audit_logs(AuditLogQuery {
                club_id: Some("c1".into()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_club.len(), 1);

        let by_actor = db
            .list_audit_logs(AuditLogQuery {
                actor_id: Some("a".into()),
                limit: 50,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_actor.len(), 2);
        assert!(by_actor[0].club_id.is_none());
    }
}

use chrono::{DateTime, Utc};
use serde_json::json;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::lifecycle::{self, ChecklistUpdate, Outcome, Transition};
use clubhub_core::rbac::{Action, Grant, Resource};
use clubhub_core::types::{
    CreateAuditLog, CreateEvent, CreateNotification, EventFilter, StatusChange, UpdateEvent,
};
use clubhub_core::{
    Approval, Club, Event, EventStatus, GlobalRole, HubContext, HubError, HubResult,
    NotificationKind, User,
};

use crate::plugins::helpers::{
    Page, admin_ids, can_view_internal, leadership_ids, load_club, load_event,
    require_club_permission,
};

use super::types::*;

// ---------------------------------------------------------------------------
// Transition plumbing
// ---------------------------------------------------------------------------

/// Result of driving a user transition through the store.
enum Applied {
    Changed(Event),
    Unchanged(Event),
}

/// Apply `transition` to `event` with a compare-and-set on its status.
///
/// A lost race is re-evaluated against the stored status: if the same
/// transition already landed the call is a no-op, otherwise it conflicts.
async fn drive<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    event: Event,
    transition: Transition,
    requires_admin: bool,
    change: impl FnOnce(EventStatus) -> StatusChange,
) -> HubResult<Applied> {
    let to = match lifecycle::apply(event.status, transition, requires_admin)? {
        Outcome::AlreadyApplied => return Ok(Applied::Unchanged(event)),
        Outcome::Moved(to) => to,
    };

    if let Some(updated) = ctx
        .database
        .transition_event(&event.id, event.status, change(to))
        .await?
    {
        return Ok(Applied::Changed(updated));
    }

    let current = load_event(ctx, &event.id).await?;
    match lifecycle::apply(current.status, transition, requires_admin)? {
        Outcome::AlreadyApplied => Ok(Applied::Unchanged(current)),
        Outcome::Moved(_) => Err(HubError::conflict(
            "The event changed while this request was processed; try again",
        )),
    }
}

fn event_link(event: &Event) -> String {
    format!("/events/{}", event.id)
}

async fn audit_transition<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    actor_id: &str,
    transition: Transition,
    from: EventStatus,
    event: &Event,
) {
    ctx.audit()
        .record(
            CreateAuditLog::new(actor_id, transition.audit_action(), "event", &event.id)
                .club(&event.club_id)
                .details(json!({ "from": from, "to": event.status })),
        )
        .await;
}

/// Leadership of the host club and every participating club.
async fn organiser_ids<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    event: &Event,
) -> HubResult<Vec<String>> {
    let mut ids = leadership_ids(ctx, &event.club_id).await?;
    for club_id in &event.participating_club_ids {
        ids.extend(leadership_ids(ctx, club_id).await?);
    }
    Ok(ids)
}

async fn notify_users<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    recipients: Vec<String>,
    kind: NotificationKind,
    title: &str,
    message: String,
    event: &Event,
) {
    let notification = CreateNotification::new("", kind, title, message).link(event_link(event));
    ctx.notifier()
        .notify_all_quietly(recipients, &notification)
        .await;
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_schedule(
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    now: DateTime<Utc>,
    start_changed: bool,
) -> HubResult<()> {
    if end_at <= start_at {
        return Err(HubError::bad_request("Event must end after it starts"));
    }
    if start_changed && start_at <= now {
        return Err(HubError::bad_request("Event must start in the future"));
    }
    Ok(())
}

/// Deduplicate participants and check each is another active club.
async fn validate_participants<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    host: &Club,
    participants: Vec<String>,
) -> HubResult<Vec<String>> {
    let mut unique: Vec<String> = Vec::with_capacity(participants.len());
    for club_id in participants {
        if club_id == host.id {
            return Err(HubError::bad_request(
                "The host club cannot also be a participant",
            ));
        }
        if unique.contains(&club_id) {
            continue;
        }
        let club = load_club(ctx, &club_id).await?;
        if !club.is_active() {
            return Err(HubError::bad_request(format!(
                "{} is not active and cannot participate",
                club.name
            )));
        }
        unique.push(club_id);
    }
    Ok(unique)
}

fn require_draft(event: &Event, verb: &str) -> HubResult<()> {
    if event.status != EventStatus::Draft {
        return Err(HubError::bad_request(format!(
            "Only draft events can be {}; this event is {}",
            verb, event.status
        )));
    }
    Ok(())
}

/// Whether `viewer` may see `event` in its current status.
async fn can_view_event<DB: DatabaseAdapter>(
    ctx: &HubContext<DB>,
    viewer: Option<&User>,
    event: &Event,
) -> HubResult<bool> {
    if event.status.is_public() {
        return Ok(true);
    }
    let Some(viewer) = viewer else {
        return Ok(false);
    };
    if viewer.role == GlobalRole::Admin {
        return Ok(true);
    }
    for club_id in std::iter::once(&event.club_id).chain(&event.participating_club_ids) {
        if let Some(club) = ctx.database.get_club_by_id(club_id).await? {
            if can_view_internal(ctx, Some(viewer), &club).await? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

// ---------------------------------------------------------------------------
// Core functions -- framework-agnostic business logic
// ---------------------------------------------------------------------------

pub(crate) async fn create_event_core<DB: DatabaseAdapter>(
    body: CreateEventRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventResponse> {
    let club = load_club(ctx, &body.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Event, Action::Create).await?;

    if !club.is_active() {
        return Err(HubError::bad_request("Inactive clubs cannot create events"));
    }
    validate_schedule(body.start_at, body.end_at, Utc::now(), true)?;
    let participating_club_ids =
        validate_participants(ctx, &club, body.participating_club_ids).await?;

    let event = ctx
        .database
        .create_event(CreateEvent {
            club_id: club.id.clone(),
            participating_club_ids,
            title: body.title.trim().to_string(),
            description: body.description,
            venue: body.venue.trim().to_string(),
            start_at: body.start_at,
            end_at: body.end_at,
            budget: body.budget,
            expected_attendance: body.expected_attendance,
            created_by: user.id.clone(),
        })
        .await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "event.create", "event", &event.id)
                .club(&club.id)
                .details(json!({ "title": event.title, "budget": event.budget })),
        )
        .await;

    Ok(EventResponse { event })
}

pub(crate) async fn update_event_core<DB: DatabaseAdapter>(
    body: UpdateEventRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Event, Action::Update).await?;
    require_draft(&event, "edited")?;

    validate_schedule(
        body.start_at.unwrap_or(event.start_at),
        body.end_at.unwrap_or(event.end_at),
        Utc::now(),
        body.start_at.is_some(),
    )?;
    let participating_club_ids = match body.participating_club_ids {
        Some(ids) => Some(validate_participants(ctx, &club, ids).await?),
        None => None,
    };

    let updated = ctx
        .database
        .update_event(
            &event.id,
            UpdateEvent {
                participating_club_ids,
                title: body.title.map(|t| t.trim().to_string()),
                description: body.description,
                venue: body.venue.map(|v| v.trim().to_string()),
                start_at: body.start_at,
                end_at: body.end_at,
                budget: body.budget,
                expected_attendance: body.expected_attendance,
            },
        )
        .await?;

    ctx.audit()
        .record(CreateAuditLog::new(&user.id, "event.update", "event", &event.id).club(&club.id))
        .await;

    Ok(EventResponse { event: updated })
}

pub(crate) async fn delete_event_core<DB: DatabaseAdapter>(
    body: EventIdRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Event, Action::Delete).await?;
    require_draft(&event, "deleted")?;

    ctx.database.delete_event(&event.id).await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "event.delete", "event", &event.id)
                .club(&club.id)
                .details(json!({ "title": event.title })),
        )
        .await;

    Ok(EventResponse { event })
}

pub(crate) async fn submit_event_core<DB: DatabaseAdapter>(
    body: EventIdRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventChangeResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Event, Action::Submit).await?;

    if event.status == EventStatus::Draft {
        if !club.is_active() {
            return Err(HubError::bad_request("Inactive clubs cannot submit events"));
        }
        if event.start_at <= Utc::now() {
            return Err(HubError::bad_request(
                "The event start has passed; reschedule it before submitting",
            ));
        }
    }

    let from = event.status;
    match drive(ctx, event, Transition::Submit, false, StatusChange::to).await? {
        Applied::Unchanged(event) => Ok(EventChangeResponse {
            event,
            changed: false,
        }),
        Applied::Changed(event) => {
            audit_transition(ctx, &user.id, Transition::Submit, from, &event).await;
            notify_users(
                ctx,
                vec![club.coordinator_id.clone()],
                NotificationKind::EventSubmitted,
                "Event awaiting approval",
                format!("{} submitted \"{}\" for approval", club.name, event.title),
                &event,
            )
            .await;
            Ok(EventChangeResponse {
                event,
                changed: true,
            })
        }
    }
}

pub(crate) async fn approve_event_core<DB: DatabaseAdapter>(
    body: ApproveEventRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventChangeResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    let grant = require_club_permission(ctx, user, &club, Resource::Event, Action::Approve).await?;

    let transition = match (event.status, grant) {
        (EventStatus::PendingCoordinator, _) => Transition::CoordinatorApprove,
        // A coordinator repeating their approval lands on AlreadyApplied
        (_, Grant::Admin) => Transition::AdminApprove,
        _ => Transition::CoordinatorApprove,
    };

    let requires_admin = lifecycle::requires_admin_approval(
        &event,
        ctx.config.events.admin_approval_budget_threshold,
    );
    let approval = Approval {
        by: user.id.clone(),
        at: Utc::now(),
        note: body.note,
    };
    let from = event.status;
    let applied = drive(ctx, event, transition, requires_admin, |to| match transition {
        Transition::AdminApprove => StatusChange::to(to).admin_approval(approval),
        _ => StatusChange::to(to).coordinator_approval(approval),
    })
    .await?;

    let event = match applied {
        Applied::Unchanged(event) => {
            return Ok(EventChangeResponse {
                event,
                changed: false,
            });
        }
        Applied::Changed(event) => event,
    };

    audit_transition(ctx, &user.id, transition, from, &event).await;

    if event.status == EventStatus::PendingAdmin {
        notify_users(
            ctx,
            admin_ids(ctx).await?,
            NotificationKind::EventSubmitted,
            "Event awaiting final approval",
            format!("\"{}\" by {} needs an administrator's approval", event.title, club.name),
            &event,
        )
        .await;
        notify_users(
            ctx,
            vec![event.created_by.clone()],
            NotificationKind::EventApproved,
            "Coordinator approved your event",
            format!("\"{}\" is now waiting for final approval", event.title),
            &event,
        )
        .await;
    } else {
        let mut recipients = organiser_ids(ctx, &event).await?;
        recipients.push(event.created_by.clone());
        notify_users(
            ctx,
            recipients,
            NotificationKind::EventPublished,
            "Event published",
            format!("\"{}\" has been approved and published", event.title),
            &event,
        )
        .await;
    }

    Ok(EventChangeResponse {
        event,
        changed: true,
    })
}

pub(crate) async fn reject_event_core<DB: DatabaseAdapter>(
    body: RejectEventRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<EventChangeResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    let grant = require_club_permission(ctx, user, &club, Resource::Event, Action::Approve).await?;

    if event.status == EventStatus::PendingAdmin && grant != Grant::Admin {
        return Err(HubError::forbidden(
            "Only an administrator can reject an event at this stage",
        ));
    }

    let from = event.status;
    let reason = body.reason.trim().to_string();
    let applied = drive(ctx, event, Transition::Reject, false, |to| {
        StatusChange::to(to).rejection_reason(reason.clone())
    })
    .await?;

    let event = match applied {
        Applied::Unchanged(event) => {
            return Ok(EventChangeResponse {
                event,
                changed: false,
            });
        }
        Applied::Changed(event) => event,
    };

    audit_transition(ctx, &user.id, Transition::Reject, from, &event).await;

    let mut recipients = leadership_ids(ctx, &event.club_id).await?;
    recipients.push(event.created_by.clone());
    notify_users(
        ctx,
        recipients,
        NotificationKind::EventRejected,
        "Event sent back",
        format!("\"{}\" was returned to draft: {}", event.title, reason),
        &event,
    )
    .await;

    Ok(EventChangeResponse {
        event,
        changed: true,
    })
}

pub(crate) async fn update_checklist_core<DB: DatabaseAdapter>(
    body: UpdateChecklistRequest,
    user: &User,
    ctx: &HubContext<DB>,
) -> HubResult<ChecklistResponse> {
    let event = load_event(ctx, &body.event_id).await?;
    let club = load_club(ctx, &event.club_id).await?;
    require_club_permission(ctx, user, &club, Resource::Event, Action::Update).await?;

    if event.status != EventStatus::PendingCompletion {
        return Err(HubError::bad_request(format!(
            "The checklist can only change while completion is pending; this event is {}",
            event.status
        )));
    }
    if event.completion_deadline.is_some_and(|deadline| Utc::now() > deadline) {
        return Err(HubError::bad_request(
            "The completion deadline has passed; the event will be marked incomplete",
        ));
    }

    let checklist = event.checklist.merge(ChecklistUpdate {
        photos: body.photos,
        report: body.report,
        attendance: body.attendance,
        bills: body.bills,
    });
    let event = ctx
        .database
        .update_event_checklist(&event.id, checklist)
        .await?;

    ctx.audit()
        .record(
            CreateAuditLog::new(&user.id, "event.update_checklist", "event", &event.id)
                .club(&club.id)
                .details(json!({ "checklist": checklist })),
        )
        .await;

    if !checklist.is_complete() {
        return Ok(ChecklistResponse {
            missing: checklist.missing(),
            event,
            completed: false,
        });
    }

    let event = match drive(ctx, event, Transition::Complete, false, StatusChange::to).await? {
        Applied::Changed(event) => {
            audit_transition(
                ctx,
                &user.id,
                Transition::Complete,
                EventStatus::PendingCompletion,
                &event,
            )
            .await;
            let mut recipients = organiser_ids(ctx, &event).await?;
            recipients.push(club.coordinator_id.clone());
            notify_users(
                ctx,
                recipients,
                NotificationKind::EventCompleted,
                "Event completed",
                format!("\"{}\" is complete. Thanks for wrapping up!", event.title),
                &event,
            )
            .await;
            event
        }
        Applied::Unchanged(event) => event,
    };

    Ok(ChecklistResponse {
        missing: Vec::new(),
        completed: event.status == EventStatus::Completed,
        event,
    })
}

pub(crate) async fn get_event_core<DB: DatabaseAdapter>(
    event_id: &str,
    viewer: Option<&User>,
    ctx: &HubContext<DB>,
) -> HubResult<EventResponse> {
    let event = load_event(ctx, event_id).await?;
    if !can_view_event(ctx, viewer, &event).await? {
        return Err(HubError::not_found("Event not found"));
    }
    Ok(EventResponse { event })
}

pub(crate) async fn list_events_core<DB: DatabaseAdapter>(
    club_id: Option<&str>,
    statuses: Option<Vec<EventStatus>>,
    page: Page,
    viewer: Option<&User>,
    ctx: &HubContext<DB>,
) -> HubResult<ListEventsResponse> {
    let privileged = match (club_id, viewer) {
        (_, Some(user)) if user.role == GlobalRole::Admin => true,
        (Some(club_id), Some(_)) => {
            let club = load_club(ctx, club_id).await?;
            can_view_internal(ctx, viewer, &club).await?
        }
        (Some(club_id), None) => {
            load_club(ctx, club_id).await?;
            false
        }
        (None, _) => false,
    };

    let statuses = match (statuses, privileged) {
        (Some(statuses), true) => Some(statuses),
        (None, true) => None,
        (Some(statuses), false) => Some(statuses.into_iter().filter(|s| s.is_public()).collect()),
        (None, false) => Some(
            EventStatus::ALL
                .into_iter()
                .filter(|s| s.is_public())
                .collect(),
        ),
    };

    let events = ctx
        .database
        .list_events(EventFilter {
            club_id: club_id.map(str::to_string),
            statuses,
        })
        .await?
        .into_iter()
        .skip(page.offset)
        .take(page.limit)
        .collect();

    Ok(ListEventsResponse { events })
}

//! Clock-driven event transitions.
//!
//! Each cycle:
//! - starts published events whose start time has passed
//! - ends ongoing events and opens the completion window
//! - reminds organisers of completion deadlines that are close
//! - completes events whose checklist is full, or marks overdue ones
//!   incomplete
//! - purges expired sessions
//!
//! Every transition is a compare-and-set on the status read at the start
//! of the cycle, so a cycle racing a user request applies it at most once.
//! Audit records use the `system:scheduler` actor.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tokio::time::interval;
use tracing::{debug, info, warn};

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::lifecycle::{self, Outcome};
use clubhub_core::types::{CreateAuditLog, CreateNotification, StatusChange};
use clubhub_core::{
    Event, EventStatus, HubContext, HubResult, MembershipStatus, NotificationKind, SYSTEM_ACTOR,
    Transition,
};

/// Counts of what a single cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started: usize,
    pub ended: usize,
    /// Reminder notifications stored, after deduplication.
    pub reminded: usize,
    pub completed: usize,
    pub marked_incomplete: usize,
    pub sessions_purged: usize,
    /// Events whose transition failed; retried next cycle.
    pub failed: usize,
}

impl CycleReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Background driver for the automatic part of the event lifecycle.
pub struct LifecycleScheduler<DB: DatabaseAdapter> {
    ctx: HubContext<DB>,
    interval: Duration,
}

impl<DB: DatabaseAdapter> LifecycleScheduler<DB> {
    pub fn new(ctx: HubContext<DB>) -> Self {
        let interval = ctx.config.events.scheduler_interval;
        Self { ctx, interval }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run every job once against `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let mut report = CycleReport::default();

        self.start_due(now, &mut report).await;
        self.end_due(now, &mut report).await;
        self.settle_completion(now, &mut report).await;

        match self
            .ctx
            .session_manager()
            .cleanup_expired_sessions(now)
            .await
        {
            Ok(purged) => report.sessions_purged = purged,
            Err(e) => warn!(error = %e, "Failed to purge expired sessions"),
        }

        report
    }

    /// Start the scheduler background task.
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.interval);
            info!(interval_secs = self.interval.as_secs(), "Lifecycle scheduler started");

            loop {
                ticker.tick().await;
                let report = self.run_cycle(Utc::now()).await;
                if report.is_idle() {
                    debug!("Lifecycle cycle found nothing to do");
                } else {
                    info!(
                        started = report.started,
                        ended = report.ended,
                        reminded = report.reminded,
                        completed = report.completed,
                        incomplete = report.marked_incomplete,
                        sessions = report.sessions_purged,
                        failed = report.failed,
                        "Lifecycle cycle finished"
                    );
                }
            }
        })
    }

    async fn start_due(&self, now: DateTime<Utc>, report: &mut CycleReport) {
        let events = match self.ctx.database.events_due_to_start(now).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to list events due to start");
                return;
            }
        };

        for event in events {
            match self.advance(&event, Transition::Start, StatusChange::to).await {
                Ok(Some(event)) => {
                    report.started += 1;
                    self.notify_organisers(
                        &event,
                        false,
                        NotificationKind::EventStarted,
                        "Event started",
                        format!("\"{}\" is now under way", event.title),
                    )
                    .await;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(event_id = %event.id, error = %e, "Failed to start event");
                }
            }
        }
    }

    async fn end_due(&self, now: DateTime<Utc>, report: &mut CycleReport) {
        let events = match self.ctx.database.events_due_to_end(now).await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to list events due to end");
                return;
            }
        };

        let window = self.ctx.config.events.completion_window;
        for event in events {
            let deadline = lifecycle::completion_deadline(event.end_at, window);
            let ended = self
                .advance(&event, Transition::End, |to| {
                    StatusChange::to(to).completion_deadline(deadline)
                })
                .await;
            match ended {
                Ok(Some(event)) => {
                    report.ended += 1;
                    self.notify_organisers(
                        &event,
                        false,
                        NotificationKind::CompletionDue,
                        "Completion checklist due",
                        format!(
                            "Upload photos, the report, attendance and bills for \"{}\" by {}",
                            event.title,
                            deadline.format("%Y-%m-%d %H:%M UTC")
                        ),
                    )
                    .await;
                }
                Ok(None) => {}
                Err(e) => {
                    report.failed += 1;
                    warn!(event_id = %event.id, error = %e, "Failed to end event");
                }
            }
        }
    }

    async fn settle_completion(&self, now: DateTime<Utc>, report: &mut CycleReport) {
        let events = match self.ctx.database.events_pending_completion().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Failed to list events pending completion");
                return;
            }
        };

        let reminder_window = self.ctx.config.events.completion_reminder_window;
        for event in events {
            match lifecycle::due_transition(&event, now) {
                Some(Transition::Complete) => {
                    match self.advance(&event, Transition::Complete, StatusChange::to).await {
                        Ok(Some(event)) => {
                            report.completed += 1;
                            self.notify_organisers(
                                &event,
                                true,
                                NotificationKind::EventCompleted,
                                "Event completed",
                                format!("\"{}\" is complete", event.title),
                            )
                            .await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            report.failed += 1;
                            warn!(event_id = %event.id, error = %e, "Failed to complete event");
                        }
                    }
                }
                Some(Transition::MarkIncomplete) => {
                    match self
                        .advance(&event, Transition::MarkIncomplete, StatusChange::to)
                        .await
                    {
                        Ok(Some(event)) => {
                            report.marked_incomplete += 1;
                            self.notify_organisers(
                                &event,
                                true,
                                NotificationKind::EventIncomplete,
                                "Event marked incomplete",
                                format!(
                                    "\"{}\" missed its completion deadline. Missing: {}",
                                    event.title,
                                    event.checklist.missing().join(", ")
                                ),
                            )
                            .await;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            report.failed += 1;
                            warn!(
                                event_id = %event.id,
                                error = %e,
                                "Failed to mark event incomplete"
                            );
                        }
                    }
                }
                _ => {
                    let due_soon = event.completion_deadline.is_some_and(|deadline| {
                        deadline >= now && deadline - now <= reminder_window
                    });
                    if due_soon {
                        report.reminded += self
                            .notify_organisers(
                                &event,
                                false,
                                NotificationKind::CompletionReminder,
                                "Completion deadline approaching",
                                format!(
                                    "\"{}\" still needs: {}",
                                    event.title,
                                    event.checklist.missing().join(", ")
                                ),
                            )
                            .await;
                    }
                }
            }
        }
    }

    /// Apply an automatic transition. `Ok(None)` means someone else got
    /// there first or the transition was already in place.
    async fn advance(
        &self,
        event: &Event,
        transition: Transition,
        change: impl FnOnce(EventStatus) -> StatusChange,
    ) -> HubResult<Option<Event>> {
        let to = match lifecycle::apply(event.status, transition, false)? {
            Outcome::AlreadyApplied => return Ok(None),
            Outcome::Moved(to) => to,
        };

        let Some(updated) = self
            .ctx
            .database
            .transition_event(&event.id, event.status, change(to))
            .await?
        else {
            debug!(event_id = %event.id, %transition, "Event moved concurrently; skipping");
            return Ok(None);
        };

        self.ctx
            .audit()
            .record(
                CreateAuditLog::new(SYSTEM_ACTOR, transition.audit_action(), "event", &updated.id)
                    .club(&updated.club_id)
                    .details(json!({ "from": event.status, "to": updated.status })),
            )
            .await;

        Ok(Some(updated))
    }

    /// Notify the host club's leadership, and its coordinator if asked.
    async fn notify_organisers(
        &self,
        event: &Event,
        include_coordinator: bool,
        kind: NotificationKind,
        title: &str,
        message: String,
    ) -> usize {
        let mut recipients = match self
            .ctx
            .database
            .list_club_memberships(&event.club_id, Some(MembershipStatus::Approved))
            .await
        {
            Ok(members) => members
                .into_iter()
                .filter(|m| m.role.is_leadership())
                .map(|m| m.user_id)
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Failed to load club leadership");
                Vec::new()
            }
        };

        if include_coordinator {
            match self.ctx.database.get_club_by_id(&event.club_id).await {
                Ok(Some(club)) => recipients.push(club.coordinator_id),
                Ok(None) => {}
                Err(e) => warn!(event_id = %event.id, error = %e, "Failed to load club"),
            }
        }

        let notification = CreateNotification::new("", kind, title, message)
            .link(format!("/events/{}", event.id));
        self.ctx
            .notifier()
            .notify_all_quietly(recipients, &notification)
            .await
    }
}

//! Event status state machine.
//!
//! User-driven transitions (submit, approvals, rejection, completion) and
//! clock-driven ones (start, end, mark incomplete) all go through
//! [`apply`]. Stores persist the result with a compare-and-set on the
//! status the caller read, so a transition is applied at most once.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{HubError, HubResult};
use crate::types::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Draft,
    PendingCoordinator,
    PendingAdmin,
    Published,
    Ongoing,
    PendingCompletion,
    Completed,
    Incomplete,
}

impl EventStatus {
    pub const ALL: [EventStatus; 8] = [
        EventStatus::Draft,
        EventStatus::PendingCoordinator,
        EventStatus::PendingAdmin,
        EventStatus::Published,
        EventStatus::Ongoing,
        EventStatus::PendingCompletion,
        EventStatus::Completed,
        EventStatus::Incomplete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingCoordinator => "pending_coordinator",
            Self::PendingAdmin => "pending_admin",
            Self::Published => "published",
            Self::Ongoing => "ongoing",
            Self::PendingCompletion => "pending_completion",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Incomplete)
    }

    /// Statuses anyone, including anonymous callers, may see.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Published | Self::Ongoing | Self::Completed)
    }

    pub fn is_awaiting_approval(&self) -> bool {
        matches!(self, Self::PendingCoordinator | Self::PendingAdmin)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    Submit,
    CoordinatorApprove,
    AdminApprove,
    Reject,
    Start,
    End,
    Complete,
    MarkIncomplete,
}

impl Transition {
    pub const ALL: [Transition; 8] = [
        Transition::Submit,
        Transition::CoordinatorApprove,
        Transition::AdminApprove,
        Transition::Reject,
        Transition::Start,
        Transition::End,
        Transition::Complete,
        Transition::MarkIncomplete,
    ];

    /// Transitions only the scheduler applies.
    pub fn is_automatic(&self) -> bool {
        matches!(self, Self::Start | Self::End | Self::MarkIncomplete)
    }

    /// Action name written to the audit log.
    pub fn audit_action(&self) -> &'static str {
        match self {
            Self::Submit => "event.submit",
            Self::CoordinatorApprove => "event.coordinator_approve",
            Self::AdminApprove => "event.admin_approve",
            Self::Reject => "event.reject",
            Self::Start => "event.start",
            Self::End => "event.end",
            Self::Complete => "event.complete",
            Self::MarkIncomplete => "event.mark_incomplete",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Self::Submit => "submit",
            Self::CoordinatorApprove | Self::AdminApprove => "approve",
            Self::Reject => "reject",
            Self::Start => "start",
            Self::End => "end",
            Self::Complete => "complete",
            Self::MarkIncomplete => "mark incomplete",
        };
        f.write_str(verb)
    }
}

/// Result of applying a transition to a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Moved(EventStatus),
    /// The transition's effect is already in place; nothing to write.
    AlreadyApplied,
}

/// Compute the status reached by `transition` from `from`.
///
/// `requires_admin` decides where a coordinator approval lands.
pub fn apply(
    from: EventStatus,
    transition: Transition,
    requires_admin: bool,
) -> HubResult<Outcome> {
    use EventStatus::*;
    use Transition::*;

    let outcome = match (transition, from) {
        (Submit, Draft) => Outcome::Moved(PendingCoordinator),
        (Submit, PendingCoordinator) => Outcome::AlreadyApplied,

        (CoordinatorApprove, PendingCoordinator) if requires_admin => Outcome::Moved(PendingAdmin),
        (CoordinatorApprove, PendingCoordinator) => Outcome::Moved(Published),
        (CoordinatorApprove, PendingAdmin | Published) => Outcome::AlreadyApplied,

        (AdminApprove, PendingAdmin) => Outcome::Moved(Published),
        (AdminApprove, Published) => Outcome::AlreadyApplied,

        (Reject, PendingCoordinator | PendingAdmin) => Outcome::Moved(Draft),

        (Start, Published) => Outcome::Moved(Ongoing),
        (Start, Ongoing) => Outcome::AlreadyApplied,

        (End, Ongoing) => Outcome::Moved(PendingCompletion),
        (End, PendingCompletion) => Outcome::AlreadyApplied,

        (Complete, PendingCompletion) => Outcome::Moved(Completed),
        (Complete, Completed) => Outcome::AlreadyApplied,

        (MarkIncomplete, PendingCompletion) => Outcome::Moved(Incomplete),
        (MarkIncomplete, Incomplete) => Outcome::AlreadyApplied,

        _ => return Err(HubError::InvalidTransition { from, transition }),
    };

    Ok(outcome)
}

/// Whether a coordinator-approved event still needs an admin sign-off.
pub fn requires_admin_approval(event: &Event, budget_threshold: u64) -> bool {
    event.budget > budget_threshold || !event.participating_club_ids.is_empty()
}

pub fn completion_deadline(end_at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    end_at + window
}

/// The clock- or checklist-driven transition due for `event` at `now`.
pub fn due_transition(event: &Event, now: DateTime<Utc>) -> Option<Transition> {
    match event.status {
        EventStatus::Published if now >= event.start_at => Some(Transition::Start),
        EventStatus::Ongoing if now >= event.end_at => Some(Transition::End),
        EventStatus::PendingCompletion if event.checklist.is_complete() => {
            Some(Transition::Complete)
        }
        EventStatus::PendingCompletion
            if event.completion_deadline.is_some_and(|deadline| now > deadline) =>
        {
            Some(Transition::MarkIncomplete)
        }
        _ => None,
    }
}

/// Post-event artifacts that must all be provided to complete an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChecklist {
    pub photos: bool,
    pub report: bool,
    pub attendance: bool,
    pub bills: bool,
}

/// Partial checklist update; `None` leaves an item unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistUpdate {
    pub photos: Option<bool>,
    pub report: Option<bool>,
    pub attendance: Option<bool>,
    pub bills: Option<bool>,
}

impl CompletionChecklist {
    pub fn is_complete(&self) -> bool {
        self.photos && self.report && self.attendance && self.bills
    }

    pub fn missing(&self) -> Vec<&'static str> {
        [
            ("photos", self.photos),
            ("report", self.report),
            ("attendance", self.attendance),
            ("bills", self.bills),
        ]
        .into_iter()
        .filter(|(_, done)| !done)
        .map(|(name, _)| name)
        .collect()
    }

    pub fn merge(mut self, update: ChecklistUpdate) -> Self {
        if let Some(photos) = update.photos {
            self.photos = photos;
        }
        if let Some(report) = update.report {
            self.report = report;
        }
        if let Some(attendance) = update.attendance {
            self.attendance = attendance;
        }
        if let Some(bills) = update.bills {
            self.bills = bills;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn event(status: EventStatus) -> Event {
        let start = Utc::now() + Duration::days(1);
        Event {
            id: "e1".into(),
            club_id: "c1".into(),
            participating_club_ids: Vec::new(),
            title: "Hackathon".into(),
            description: String::new(),
            venue: "Main hall".into(),
            start_at: start,
            end_at: start + Duration::hours(6),
            budget: 500,
            expected_attendance: None,
            status,
            coordinator_approval: None,
            admin_approval: None,
            rejection_reason: None,
            checklist: CompletionChecklist::default(),
            completion_deadline: None,
            created_by: "u1".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_happy_path_without_admin() {
        let mut status = EventStatus::Draft;
        for transition in [
            Transition::Submit,
            Transition::CoordinatorApprove,
            Transition::Start,
            Transition::End,
            Transition::Complete,
        ] {
            match apply(status, transition, false).unwrap() {
                Outcome::Moved(next) => status = next,
                Outcome::AlreadyApplied => panic!("unexpected no-op for {:?}", transition),
            }
        }
        assert_eq!(status, EventStatus::Completed);
    }

    #[test]
    fn test_coordinator_approval_routes_to_admin() {
        assert_eq!(
            apply(EventStatus::PendingCoordinator, Transition::CoordinatorApprove, true).unwrap(),
            Outcome::Moved(EventStatus::PendingAdmin)
        );
        assert_eq!(
            apply(EventStatus::PendingAdmin, Transition::AdminApprove, false).unwrap(),
            Outcome::Moved(EventStatus::Published)
        );
    }

    #[test]
    fn test_admin_cannot_skip_coordinator() {
        let err =
            apply(EventStatus::PendingCoordinator, Transition::AdminApprove, true).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_repeated_transitions_are_idempotent() {
        assert_eq!(
            apply(EventStatus::Published, Transition::CoordinatorApprove, false).unwrap(),
            Outcome::AlreadyApplied
        );
        assert_eq!(
            apply(EventStatus::Published, Transition::AdminApprove, false).unwrap(),
            Outcome::AlreadyApplied
        );
        assert_eq!(
            apply(EventStatus::PendingCoordinator, Transition::Submit, false).unwrap(),
            Outcome::AlreadyApplied
        );
        assert_eq!(
            apply(EventStatus::Completed, Transition::Complete, false).unwrap(),
            Outcome::AlreadyApplied
        );
    }

    #[test]
    fn test_reject_returns_to_draft() {
        for from in [EventStatus::PendingCoordinator, EventStatus::PendingAdmin] {
            assert_eq!(
                apply(from, Transition::Reject, false).unwrap(),
                Outcome::Moved(EventStatus::Draft)
            );
        }
        assert!(apply(EventStatus::Published, Transition::Reject, false).is_err());
    }

    #[test]
    fn test_requires_admin_approval() {
        let mut e = event(EventStatus::PendingCoordinator);
        assert!(!requires_admin_approval(&e, 10_000));
        e.budget = 10_000;
        assert!(!requires_admin_approval(&e, 10_000));
        e.budget = 10_001;
        assert!(requires_admin_approval(&e, 10_000));
        e.budget = 0;
        e.participating_club_ids.push("c2".into());
        assert!(requires_admin_approval(&e, 10_000));
    }

    #[test]
    fn test_due_transition() {
        let e = event(EventStatus::Published);
        assert_eq!(due_transition(&e, Utc::now()), None);
        assert_eq!(due_transition(&e, e.start_at), Some(Transition::Start));

        let e = event(EventStatus::Ongoing);
        assert_eq!(due_transition(&e, e.end_at), Some(Transition::End));

        let mut e = event(EventStatus::PendingCompletion);
        let deadline = completion_deadline(e.end_at, Duration::days(7));
        e.completion_deadline = Some(deadline);
        assert_eq!(due_transition(&e, deadline), None);
        assert_eq!(
            due_transition(&e, deadline + Duration::seconds(1)),
            Some(Transition::MarkIncomplete)
        );

        e.checklist = CompletionChecklist {
            photos: true,
            report: true,
            attendance: true,
            bills: true,
        };
        assert_eq!(
            due_transition(&e, deadline + Duration::seconds(1)),
            Some(Transition::Complete)
        );

        let later = Utc::now() + Duration::days(30);
        assert_eq!(due_transition(&event(EventStatus::Draft), later), None);
    }

    #[test]
    fn test_checklist_merge_and_missing() {
        let checklist = CompletionChecklist::default().merge(ChecklistUpdate {
            photos: Some(true),
            bills: Some(true),
            ..Default::default()
        });
        assert_eq!(checklist.missing(), vec!["report", "attendance"]);
        assert!(!checklist.is_complete());

        let checklist = checklist.merge(ChecklistUpdate {
            report: Some(true),
            attendance: Some(true),
            ..Default::default()
        });
        assert!(checklist.is_complete());
        assert!(checklist.missing().is_empty());
    }

    #[test]
    fn test_status_wire_names() {
        for status in EventStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
            assert_eq!(EventStatus::parse(status.as_str()), Some(status));
        }
    }

    fn any_status() -> impl Strategy<Value = EventStatus> {
        (0..EventStatus::ALL.len()).prop_map(|i| EventStatus::ALL[i])
    }

    fn any_transition() -> impl Strategy<Value = Transition> {
        (0..Transition::ALL.len()).prop_map(|i| Transition::ALL[i])
    }

    proptest! {
        #[test]
        fn terminal_states_never_move(
            status in any_status(),
            transition in any_transition(),
            admin in any::<bool>(),
        ) {
            if status.is_terminal() {
                let moved = matches!(apply(status, transition, admin), Ok(Outcome::Moved(_)));
                prop_assert!(!moved);
            }
        }

        #[test]
        fn applying_twice_is_a_no_op_or_error(
            status in any_status(),
            transition in any_transition(),
            admin in any::<bool>(),
        ) {
            if let Ok(Outcome::Moved(next)) = apply(status, transition, admin) {
                match apply(next, transition, admin) {
                    Ok(Outcome::Moved(again)) => {
                        prop_assert!(false, "{:?} moved twice to {:?}", transition, again)
                    }
                    Ok(Outcome::AlreadyApplied) | Err(_) => {}
                }
            }
        }

        #[test]
        fn published_is_only_reached_through_approval(
            status in any_status(),
            transition in any_transition(),
            admin in any::<bool>(),
        ) {
            if let Ok(Outcome::Moved(EventStatus::Published)) = apply(status, transition, admin) {
                prop_assert!(matches!(
                    transition,
                    Transition::CoordinatorApprove | Transition::AdminApprove
                ));
            }
        }
    }
}

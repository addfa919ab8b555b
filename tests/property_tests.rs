//! Property-based tests using `proptest` against the assembled hub.
//!
//! These generate inputs for password validation, the budget threshold on
//! the approval chain, and arbitrary scheduler timelines.

mod common;

use chrono::{Duration, Utc};
use clubhub::adapters::EventOps;
use clubhub::types::{CreateEvent, StatusChange};
use clubhub::{EventStatus, HubConfig};
use common::{TestHarness, unique_email};
use proptest::prelude::*;
use serde_json::json;

/// Position of a status along the happy path; terminal states rank last.
fn rank(status: EventStatus) -> usize {
    match status {
        EventStatus::Draft => 0,
        EventStatus::PendingCoordinator => 1,
        EventStatus::PendingAdmin => 2,
        EventStatus::Published => 3,
        EventStatus::Ongoing => 4,
        EventStatus::PendingCompletion => 5,
        EventStatus::Completed | EventStatus::Incomplete => 6,
    }
}

proptest! {
    #[test]
    fn short_passwords_are_rejected(password in "[a-zA-Z0-9]{1,7}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = TestHarness::new().await;
            let (status, body) = h
                .send(h.post(
                    "/sign-up",
                    None,
                    json!({ "name": "Prop", "email": unique_email("short"), "password": password }),
                ))
                .await;
            prop_assert_eq!(status, 400, "password {:?} accepted: {}", password, body);
            Ok(())
        })?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn coordinator_approval_respects_budget_threshold(budget in 0u64..30_000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = TestHarness::new().await;
            let admin = h.admin().await;
            let coordinator = h.coordinator("Coord").await;
            let president = h.student("Pres").await;
            let club = h.club(&admin, "Robotics", &coordinator).await;
            h.join_as(&president, &club, "president", &coordinator).await;

            let event = h.draft_event(&president, &club, Duration::days(2), budget).await;
            h.ok_post("/event/submit", &president.token, json!({ "eventId": event })).await;
            let body = h
                .ok_post("/event/approve", &coordinator.token, json!({ "eventId": event }))
                .await;

            let expected = if budget > 10_000 { "pending_admin" } else { "published" };
            prop_assert_eq!(body["event"]["status"].as_str(), Some(expected));
            Ok(())
        })?;
    }

    #[test]
    fn scheduler_never_moves_an_event_backwards(
        mut offsets in prop::collection::vec(0i64..(12 * 24 * 60), 1..12),
        fill_checklist_at in prop::option::of(0usize..12),
    ) {
        offsets.sort_unstable();
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = TestHarness::with_config(HubConfig::new()).await;
            let db = h.hub().database().clone();
            let start = Utc::now() + Duration::hours(1);
            let event = db
                .create_event(CreateEvent {
                    club_id: "club".to_string(),
                    participating_club_ids: Vec::new(),
                    title: "Timeline".to_string(),
                    description: String::new(),
                    venue: "Hall".to_string(),
                    start_at: start,
                    end_at: start + Duration::hours(2),
                    budget: 0,
                    expected_attendance: None,
                    created_by: "someone".to_string(),
                })
                .await
                .unwrap();
            db.transition_event(
                &event.id,
                EventStatus::Draft,
                StatusChange::to(EventStatus::Published),
            )
            .await
            .unwrap();

            let scheduler = h.hub().scheduler();
            let mut last = EventStatus::Published;
            for (i, minutes) in offsets.iter().enumerate() {
                if fill_checklist_at == Some(i) {
                    let current = db.get_event_by_id(&event.id).await.unwrap().unwrap();
                    if current.status == EventStatus::PendingCompletion {
                        let full = clubhub::CompletionChecklist {
                            photos: true,
                            report: true,
                            attendance: true,
                            bills: true,
                        };
                        db.update_event_checklist(&event.id, full).await.unwrap();
                    }
                }

                let report = scheduler.run_cycle(start + Duration::minutes(*minutes - 60)).await;
                prop_assert_eq!(report.failed, 0);

                let status = db.get_event_by_id(&event.id).await.unwrap().unwrap().status;
                prop_assert!(rank(status) >= rank(last), "{:?} moved back to {:?}", last, status);
                if last.is_terminal() {
                    prop_assert_eq!(status, last);
                }
                last = status;
            }
            Ok(())
        })?;
    }

    #[test]
    fn unknown_permissions_are_denied(resource in "[a-z]{3,10}", action in "[a-z]{3,10}") {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let h = TestHarness::new().await;
            let admin = h.admin().await;
            let coordinator = h.coordinator("Coord").await;
            let member = h.student("Mem").await;
            let club = h.club(&admin, "Robotics", &coordinator).await;
            h.join(&member, &club, &coordinator).await;

            let body = h
                .ok_post(
                    "/membership/has-permission",
                    &member.token,
                    json!({
                        "clubId": club,
                        "permissions": { resource.clone(): [action.clone()] },
                    }),
                )
                .await;
            let known = clubhub::Resource::parse(&resource).is_some()
                && clubhub::Action::parse(&action).is_some();
            if !known {
                prop_assert_eq!(&body["success"], &json!(false));
            }
            Ok(())
        })?;
    }
}

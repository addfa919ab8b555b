use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::Event;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateEventRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
    #[serde(rename = "participatingClubIds", default)]
    pub participating_club_ids: Vec<String>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: String,
    #[validate(length(min = 1, max = 200, message = "Venue must be 1-200 characters"))]
    pub venue: String,
    #[serde(rename = "startAt")]
    pub start_at: DateTime<Utc>,
    #[serde(rename = "endAt")]
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub budget: u64,
    #[serde(rename = "expectedAttendance")]
    pub expected_attendance: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateEventRequest {
    #[serde(rename = "eventId")]
    #[validate(length(min = 1, message = "eventId is required"))]
    pub event_id: String,
    #[serde(rename = "participatingClubIds")]
    pub participating_club_ids: Option<Vec<String>>,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 5000, message = "Description is too long"))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Venue must be 1-200 characters"))]
    pub venue: Option<String>,
    #[serde(rename = "startAt")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(rename = "endAt")]
    pub end_at: Option<DateTime<Utc>>,
    pub budget: Option<u64>,
    #[serde(rename = "expectedAttendance")]
    pub expected_attendance: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EventIdRequest {
    #[serde(rename = "eventId")]
    #[validate(length(min = 1, message = "eventId is required"))]
    pub event_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ApproveEventRequest {
    #[serde(rename = "eventId")]
    #[validate(length(min = 1, message = "eventId is required"))]
    pub event_id: String,
    #[validate(length(max = 500, message = "Note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RejectEventRequest {
    #[serde(rename = "eventId")]
    #[validate(length(min = 1, message = "eventId is required"))]
    pub event_id: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "A reason of up to 500 characters is required"
    ))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateChecklistRequest {
    #[serde(rename = "eventId")]
    #[validate(length(min = 1, message = "eventId is required"))]
    pub event_id: String,
    pub photos: Option<bool>,
    pub report: Option<bool>,
    pub attendance: Option<bool>,
    pub bills: Option<bool>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct EventResponse {
    pub event: Event,
}

#[derive(Debug, Serialize)]
pub(crate) struct EventChangeResponse {
    pub event: Event,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChecklistResponse {
    pub event: Event,
    pub missing: Vec<&'static str>,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListEventsResponse {
    pub events: Vec<Event>,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::{Club, ClubCategory, ClubRole};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateClubRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub category: ClubCategory,
    #[validate(length(max = 2000, message = "Description is too long"))]
    #[serde(default)]
    pub description: String,
    #[serde(rename = "coordinatorId")]
    #[validate(length(min = 1, message = "coordinatorId is required"))]
    pub coordinator_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateClubRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    pub category: Option<ClubCategory>,
    #[validate(length(max = 2000, message = "Description is too long"))]
    pub description: Option<String>,
    #[serde(rename = "coordinatorId")]
    pub coordinator_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClubIdRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RequestArchiveRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
    #[validate(length(
        min = 1,
        max = 500,
        message = "A reason of up to 500 characters is required"
    ))]
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct ClubResponse {
    pub club: Club,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ListClubsResponse {
    pub clubs: Vec<Club>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ClubLeader {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub role: ClubRole,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClubDetailsResponse {
    pub club: Club,
    #[serde(rename = "memberCount")]
    pub member_count: usize,
    pub leaders: Vec<ClubLeader>,
}

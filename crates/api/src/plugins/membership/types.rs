use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::{ClubRole, Membership};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ApplyRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
    #[validate(length(max = 1000, message = "Message is too long"))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MembershipIdRequest {
    #[serde(rename = "membershipId")]
    #[validate(length(min = 1, message = "membershipId is required"))]
    pub membership_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RejectRequest {
    #[serde(rename = "membershipId")]
    #[validate(length(min = 1, message = "membershipId is required"))]
    pub membership_id: String,
    #[validate(length(max = 500, message = "Reason is too long"))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateRoleRequest {
    #[serde(rename = "membershipId")]
    #[validate(length(min = 1, message = "membershipId is required"))]
    pub membership_id: String,
    pub role: ClubRole,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClubIdRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct HasPermissionRequest {
    #[serde(rename = "clubId")]
    #[validate(length(min = 1, message = "clubId is required"))]
    pub club_id: String,
    pub permissions: HashMap<String, Vec<String>>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct MembershipResponse {
    pub membership: Membership,
    pub changed: bool,
}

/// A membership annotated with its club's name.
#[derive(Debug, Serialize)]
pub(crate) struct MembershipWithClub {
    #[serde(flatten)]
    pub membership: Membership,
    #[serde(rename = "clubName")]
    pub club_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MemberSummary {
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A membership annotated with its holder.
#[derive(Debug, Serialize)]
pub(crate) struct MembershipWithUser {
    #[serde(flatten)]
    pub membership: Membership,
    pub user: Option<MemberSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListMembershipsResponse<T> {
    pub memberships: Vec<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HasPermissionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::User;

use crate::plugins::helpers::Page;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SetRoleRequest {
    #[serde(rename = "userId")]
    #[validate(length(min = 1, message = "userId is required"))]
    pub user_id: String,
    #[validate(length(min = 1, message = "role is required"))]
    pub role: String,
}

#[derive(Debug)]
pub(crate) struct ListUsersQuery {
    pub role: Option<String>,
    pub page: Page,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SetRoleResponse {
    pub user: User,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ListUsersResponse {
    pub users: Vec<User>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

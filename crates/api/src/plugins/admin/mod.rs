use async_trait::async_trait;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::{HttpMethod, HubContext, HubPlugin, HubRequest, HubResponse, HubRoute};
use clubhub_core::{HubError, HubResult};

use super::helpers::{page, require_admin, require_session};

pub(super) mod handlers;
pub(super) mod types;

#[cfg(test)]
mod tests;

pub use handlers::bootstrap_admin;

use handlers::*;
use types::*;

// ---------------------------------------------------------------------------
// Plugin & config
// ---------------------------------------------------------------------------

/// Global role management.
///
/// All endpoints require an authenticated session with the `admin` role.
pub struct AdminPlugin {
    config: AdminConfig,
}

/// Configuration for the admin plugin.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Default number of users returned in list-users (default: 100).
    pub default_page_limit: usize,
    /// Maximum number of users returned in list-users (default: 500).
    pub max_page_limit: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 100,
            max_page_limit: 500,
        }
    }
}

impl AdminPlugin {
    pub fn new() -> Self {
        Self {
            config: AdminConfig::default(),
        }
    }

    pub fn with_config(config: AdminConfig) -> Self {
        Self { config }
    }

    pub fn default_page_limit(mut self, limit: usize) -> Self {
        self.config.default_page_limit = limit;
        self
    }

    pub fn max_page_limit(mut self, limit: usize) -> Self {
        self.config.max_page_limit = limit;
        self
    }
}

impl Default for AdminPlugin {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Plugin trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for AdminPlugin {
    fn name(&self) -> &'static str {
        "admin"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::post("/admin/set-role", "admin_set_role"),
            HubRoute::get("/admin/list-users", "admin_list_users"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Post, "/admin/set-role") => {
                Ok(Some(self.handle_set_role(req, ctx).await?))
            }
            (HttpMethod::Get, "/admin/list-users") => {
                Ok(Some(self.handle_list_users(req, ctx).await?))
            }
            _ => Ok(None),
        }
    }
}

impl AdminPlugin {
    async fn handle_set_role<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let body: SetRoleRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = set_role_core(&body, &admin, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_list_users<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let query = ListUsersQuery {
            role: req.query.get("role").cloned(),
            page: page(
                &req.query,
                self.config.default_page_limit,
                self.config.max_page_limit,
            )?,
        };
        let response = list_users_core(&query, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }
}

use async_trait::async_trait;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::{HttpMethod, HubContext, HubPlugin, HubRequest, HubResponse, HubRoute};
use clubhub_core::{HubError, HubResult, MembershipStatus};

use super::helpers::{parse_wire, require_query, require_session};

pub(super) mod handlers;
pub(super) mod types;


pub(crate) use handlers::memberships_with_club;

use handlers::*;
use types::*;

/// Club applications, approvals, scoped role changes and departures.
pub struct MembershipPlugin;

impl MembershipPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MembershipPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for MembershipPlugin {
    fn name(&self) -> &'static str {
        "membership"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::post("/membership/apply", "apply_membership"),
            HubRoute::post("/membership/approve", "approve_membership"),
            HubRoute::post("/membership/reject", "reject_membership"),
            HubRoute::post("/membership/update-role", "update_member_role"),
            HubRoute::post("/membership/remove", "remove_member"),
            HubRoute::post("/membership/leave", "leave_club"),
            HubRoute::get("/membership/list", "list_memberships"),
            HubRoute::get("/membership/mine", "my_memberships"),
            HubRoute::post("/membership/has-permission", "has_club_permission"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Post, "/membership/apply") => {
                Ok(Some(self.handle_apply(req, ctx).await?))
            }
            (HttpMethod::Post, "/membership/approve") => {
                Ok(Some(self.handle_approve(req, ctx).await?))
            }
            (HttpMethod::Post, "/membership/reject") => {
                Ok(Some(self.handle_reject(req, ctx).await?))
            }
            (HttpMethod::Post, "/membership/update-role") => {
                Ok(Some(self.handle_update_role(req, ctx).await?))
            }
            (HttpMethod::Post, "/membership/remove") => {
                Ok(Some(self.handle_remove(req, ctx).await?))
            }
            (HttpMethod::Post, "/membership/leave") => {
                Ok(Some(self.handle_leave(req, ctx).await?))
            }
            (HttpMethod::Get, "/membership/list") => Ok(Some(self.handle_list(req, ctx).await?)),
            (HttpMethod::Get, "/membership/mine") => Ok(Some(self.handle_mine(req, ctx).await?)),
            (HttpMethod::Post, "/membership/has-permission") => {
                Ok(Some(self.handle_has_permission(req, ctx).await?))
            }
            _ => Ok(None),
        }
    }
}

impl MembershipPlugin {
    async fn handle_apply<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: ApplyRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = apply_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_approve<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: MembershipIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = approve_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_reject<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: RejectRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = reject_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_update_role<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: UpdateRoleRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = update_role_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_remove<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: MembershipIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = remove_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_leave<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: ClubIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = leave_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_list<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let club_id = require_query(&req.query, "clubId")?;
        let status = req
            .query
            .get("status")
            .map(|s| parse_wire::<MembershipStatus>(s, "status"))
            .transpose()?;
        let response = list_core(club_id, status, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_mine<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let memberships = memberships_with_club(ctx, &user.id).await?;
        HubResponse::json(200, &ListMembershipsResponse { memberships }).map_err(HubError::from)
    }

    async fn handle_has_permission<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: HasPermissionRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = has_permission_core(&body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }
}

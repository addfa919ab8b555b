use async_trait::async_trait;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::{ClubCategory, ClubStatus};
use clubhub_core::{HttpMethod, HubContext, HubPlugin, HubRequest, HubResponse, HubRoute};
use clubhub_core::{HubError, HubResult};

use super::helpers::{parse_wire, require_admin, require_query, require_session};

pub(super) mod handlers;
pub(super) mod types;


use handlers::*;
use types::*;

/// Club registry: creation by admins, edits by club staff, public listings
/// and the archive workflow.
///
/// Listings and details are served from the hub cache; every mutation
/// drops the cached entries.
pub struct ClubPlugin;

impl ClubPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ClubPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for ClubPlugin {
    fn name(&self) -> &'static str {
        "club"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::post("/club/create", "create_club"),
            HubRoute::post("/club/update", "update_club"),
            HubRoute::get("/club/list", "list_clubs"),
            HubRoute::get("/club/get", "get_club"),
            HubRoute::post("/club/request-archive", "request_club_archive"),
            HubRoute::post("/club/approve-archive", "approve_club_archive"),
            HubRoute::post("/club/reject-archive", "reject_club_archive"),
            HubRoute::post("/club/restore", "restore_club"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Post, "/club/create") => Ok(Some(self.handle_create(req, ctx).await?)),
            (HttpMethod::Post, "/club/update") => Ok(Some(self.handle_update(req, ctx).await?)),
            (HttpMethod::Get, "/club/list") => Ok(Some(self.handle_list(req, ctx).await?)),
            (HttpMethod::Get, "/club/get") => Ok(Some(self.handle_get(req, ctx).await?)),
            (HttpMethod::Post, "/club/request-archive") => {
                Ok(Some(self.handle_request_archive(req, ctx).await?))
            }
            (HttpMethod::Post, "/club/approve-archive") => {
                Ok(Some(self.handle_approve_archive(req, ctx).await?))
            }
            (HttpMethod::Post, "/club/reject-archive") => {
                Ok(Some(self.handle_reject_archive(req, ctx).await?))
            }
            (HttpMethod::Post, "/club/restore") => Ok(Some(self.handle_restore(req, ctx).await?)),
            _ => Ok(None),
        }
    }
}

impl ClubPlugin {
    async fn handle_create<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let body: CreateClubRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = create_club_core(body, &admin, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_update<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: UpdateClubRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = update_club_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_list<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let status = req
            .query
            .get("status")
            .map(|s| parse_wire::<ClubStatus>(s, "status"))
            .transpose()?
            .unwrap_or(ClubStatus::Active);
        let category = req
            .query
            .get("category")
            .map(|c| parse_wire::<ClubCategory>(c, "category"))
            .transpose()?;
        let response = list_clubs_core(status, category, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_get<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let club_id = require_query(&req.query, "clubId")?;
        let response = get_club_core(club_id, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_request_archive<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: RequestArchiveRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = request_archive_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_approve_archive<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let body: ClubIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = approve_archive_core(body, &admin, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_reject_archive<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let body: ClubIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = reject_archive_core(body, &admin, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_restore<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (admin, _session) = require_session(req, ctx).await?;
        require_admin(&admin)?;
        let body: ClubIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = restore_club_core(body, &admin, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }
}

use async_trait::async_trait;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::{
    EventStatus, HttpMethod, HubContext, HubPlugin, HubRequest, HubResponse, HubRoute,
};
use clubhub_core::{HubError, HubResult};

use super::helpers::{optional_user, page, parse_wire, require_query, require_session};

pub(super) mod handlers;
pub(super) mod types;


use handlers::*;
use types::*;

/// Configuration for the event plugin.
#[derive(Debug, Clone)]
pub struct EventPluginConfig {
    pub default_page_limit: usize,
    pub max_page_limit: usize,
}

impl Default for EventPluginConfig {
    fn default() -> Self {
        Self {
            default_page_limit: 50,
            max_page_limit: 200,
        }
    }
}

/// Event drafting, the approval chain and post-event completion.
///
/// Status changes go through [`clubhub_core::lifecycle::apply`]; clock-driven
/// transitions (start, end, incomplete) belong to the lifecycle scheduler.
pub struct EventPlugin {
    config: EventPluginConfig,
}

impl EventPlugin {
    pub fn new() -> Self {
        Self {
            config: EventPluginConfig::default(),
        }
    }

    pub fn with_config(config: EventPluginConfig) -> Self {
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

impl Default for EventPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for EventPlugin {
    fn name(&self) -> &'static str {
        "event"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::post("/event/create", "create_event"),
            HubRoute::post("/event/update", "update_event"),
            HubRoute::post("/event/delete", "delete_event"),
            HubRoute::post("/event/submit", "submit_event"),
            HubRoute::post("/event/approve", "approve_event"),
            HubRoute::post("/event/reject", "reject_event"),
            HubRoute::post("/event/update-checklist", "update_event_checklist"),
            HubRoute::get("/event/get", "get_event"),
            HubRoute::get("/event/list", "list_events"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Post, "/event/create") => Ok(Some(self.handle_create(req, ctx).await?)),
            (HttpMethod::Post, "/event/update") => Ok(Some(self.handle_update(req, ctx).await?)),
            (HttpMethod::Post, "/event/delete") => Ok(Some(self.handle_delete(req, ctx).await?)),
            (HttpMethod::Post, "/event/submit") => Ok(Some(self.handle_submit(req, ctx).await?)),
            (HttpMethod::Post, "/event/approve") => {
                Ok(Some(self.handle_approve(req, ctx).await?))
            }
            (HttpMethod::Post, "/event/reject") => Ok(Some(self.handle_reject(req, ctx).await?)),
            (HttpMethod::Post, "/event/update-checklist") => {
                Ok(Some(self.handle_update_checklist(req, ctx).await?))
            }
            (HttpMethod::Get, "/event/get") => Ok(Some(self.handle_get(req, ctx).await?)),
            (HttpMethod::Get, "/event/list") => Ok(Some(self.handle_list(req, ctx).await?)),
            _ => Ok(None),
        }
    }
}

impl EventPlugin {
    async fn handle_create<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: CreateEventRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = create_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_update<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: UpdateEventRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = update_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_delete<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: EventIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = delete_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_submit<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: EventIdRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = submit_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_approve<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: ApproveEventRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = approve_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_reject<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: RejectEventRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = reject_event_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_update_checklist<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: UpdateChecklistRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };
        let response = update_checklist_core(body, &user, ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_get<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let viewer = optional_user(req, ctx).await?;
        let event_id = require_query(&req.query, "eventId")?;
        let response = get_event_core(event_id, viewer.as_ref(), ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }

    async fn handle_list<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let viewer = optional_user(req, ctx).await?;
        let club_id = req.query.get("clubId").map(String::as_str).filter(|v| !v.is_empty());
        // `status` accepts a comma-separated list
        let statuses = req
            .query
            .get("status")
            .map(|raw| {
                raw.split(',')
                    .map(|s| parse_wire::<EventStatus>(s.trim(), "status"))
                    .collect::<HubResult<Vec<_>>>()
            })
            .transpose()?;
        let page = page(
            &req.query,
            self.config.default_page_limit,
            self.config.max_page_limit,
        )?;
        let response = list_events_core(club_id, statuses, page, viewer.as_ref(), ctx).await?;
        HubResponse::json(200, &response).map_err(HubError::from)
    }
}

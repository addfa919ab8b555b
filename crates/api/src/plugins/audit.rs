use async_trait::async_trait;
use serde::Serialize;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::rbac::{Action, Resource};
use clubhub_core::types::AuditLogQuery;
use clubhub_core::{AuditLog, HttpMethod, HubRequest, HubResponse};
use clubhub_core::{HubContext, HubPlugin, HubRoute};
use clubhub_core::{HubError, HubResult};

use super::helpers::{load_club, page, require_admin, require_club_permission, require_session};

/// Read access to the audit trail.
///
/// Admins may query the whole log. Coordinators must scope the query to a
/// club they coordinate.
pub struct AuditPlugin;

#[derive(Debug, Serialize)]
struct ListAuditLogsResponse {
    logs: Vec<AuditLog>,
    limit: usize,
    offset: usize,
}

impl AuditPlugin {
    pub fn new() -> Self {
        Self
    }

    async fn handle_list<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let page = page(&req.query, 50, 200)?;
        let club_id = req.query.get("clubId").filter(|v| !v.is_empty()).cloned();

        match &club_id {
            Some(club_id) => {
                let club = load_club(ctx, club_id).await?;
                require_club_permission(ctx, &user, &club, Resource::AuditLog, Action::Read)
                    .await?;
            }
            None => require_admin(&user)?,
        }

        let logs = ctx
            .database
            .list_audit_logs(AuditLogQuery {
                club_id,
                actor_id: req.query.get("actorId").filter(|v| !v.is_empty()).cloned(),
                limit: page.limit,
                offset: page.offset,
            })
            .await?;

        HubResponse::json(
            200,
            &ListAuditLogsResponse {
                logs,
                limit: page.limit,
                offset: page.offset,
            },
        )
        .map_err(HubError::from)
    }
}

impl Default for AuditPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for AuditPlugin {
    fn name(&self) -> &'static str {
        "audit"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![HubRoute::get("/audit/list", "list_audit_logs")]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Get, "/audit/list") => Ok(Some(self.handle_list(req, ctx).await?)),
            _ => Ok(None),
        }
    }
}

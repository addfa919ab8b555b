use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::{HttpMethod, HubRequest, HubResponse, Notification};
use clubhub_core::{HubContext, HubPlugin, HubRoute};
use clubhub_core::{HubError, HubResult};

use super::helpers::{page, query_flag, require_session};

/// The signed-in user's notification inbox.
pub struct NotificationPlugin {
    default_page_limit: usize,
    max_page_limit: usize,
}

#[derive(Debug, Deserialize, Validate)]
struct MarkReadRequest {
    #[serde(rename = "notificationId")]
    #[validate(length(min = 1, message = "notificationId is required"))]
    notification_id: String,
}

#[derive(Debug, Serialize)]
struct ListNotificationsResponse {
    notifications: Vec<Notification>,
    #[serde(rename = "unreadCount")]
    unread_count: usize,
}

#[derive(Debug, Serialize)]
struct NotificationResponse {
    notification: Notification,
}

#[derive(Debug, Serialize)]
struct CountResponse {
    count: usize,
}

impl NotificationPlugin {
    pub fn new() -> Self {
        Self {
            default_page_limit: 20,
            max_page_limit: 100,
        }
    }

    pub fn default_page_limit(mut self, limit: usize) -> Self {
        self.default_page_limit = limit;
        self
    }

    async fn handle_list<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let page = page(&req.query, self.default_page_limit, self.max_page_limit)?;
        let unread_only = query_flag(&req.query, "unreadOnly");

        let notifications = ctx
            .database
            .list_user_notifications(&user.id, unread_only, page.limit, page.offset)
            .await?;
        let unread_count = ctx.database.count_unread_notifications(&user.id).await?;

        Ok(HubResponse::json(
            200,
            &ListNotificationsResponse {
                notifications,
                unread_count,
            },
        )?)
    }

    async fn handle_mark_read<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let body: MarkReadRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };

        // Other users' notifications read as missing
        let notification = ctx
            .database
            .mark_notification_read(&user.id, &body.notification_id)
            .await?
            .ok_or_else(|| HubError::not_found("Notification not found"))?;

        Ok(HubResponse::json(200, &NotificationResponse { notification })?)
    }

    async fn handle_mark_all_read<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let count = ctx.database.mark_all_notifications_read(&user.id).await?;
        Ok(HubResponse::json(200, &CountResponse { count })?)
    }

    async fn handle_unread_count<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;
        let count = ctx.database.count_unread_notifications(&user.id).await?;
        Ok(HubResponse::json(200, &CountResponse { count })?)
    }
}

impl Default for NotificationPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for NotificationPlugin {
    fn name(&self) -> &'static str {
        "notification"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::get("/notification/list", "list_notifications"),
            HubRoute::post("/notification/mark-read", "mark_notification_read"),
            HubRoute::post("/notification/mark-all-read", "mark_all_notifications_read"),
            HubRoute::get("/notification/unread-count", "unread_notification_count"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Get, "/notification/list") => Ok(Some(self.handle_list(req, ctx).await?)),
            (HttpMethod::Post, "/notification/mark-read") => {
                Ok(Some(self.handle_mark_read(req, ctx).await?))
            }
            (HttpMethod::Post, "/notification/mark-all-read") => {
                Ok(Some(self.handle_mark_all_read(req, ctx).await?))
            }
            (HttpMethod::Get, "/notification/unread-count") => {
                Ok(Some(self.handle_unread_count(req, ctx).await?))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::test_helpers::{self, get, json_body, post};
    use clubhub_core::adapters::{MemoryDatabaseAdapter, NotificationOps};
    use clubhub_core::types::CreateNotification;
    use clubhub_core::{GlobalRole, NotificationKind};

    async fn seed(ctx: &HubContext<MemoryDatabaseAdapter>, user_id: &str) {
        for kind in [
            NotificationKind::MembershipApproved,
            NotificationKind::EventPublished,
            NotificationKind::RoleChanged,
        ] {
            ctx.database
                .create_notification(CreateNotification::new(
                    user_id,
                    kind,
                    "Update",
                    "Something happened",
                ))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_list_newest_first_with_unread_count() {
        let ctx = test_helpers::create_test_context();
        let (user, token) = test_helpers::signed_in(&ctx, "Asha", GlobalRole::Student).await;
        seed(&ctx, &user.id).await;

        let resp = NotificationPlugin::new()
            .on_request(&get("/notification/list", Some(token.as_str()), &[("limit", "2")]), &ctx)
            .await
            .unwrap()
            .unwrap();
        let body = json_body(&resp);
        assert_eq!(body["notifications"].as_array().unwrap().len(), 2);
        assert_eq!(
            body["notifications"][0]["kind"],
            serde_json::json!(NotificationKind::RoleChanged)
        );
        assert_eq!(body["unreadCount"], 3);
    }

    #[tokio::test]
    async fn test_mark_read_only_own_notifications() {
        let ctx = test_helpers::create_test_context();
        let plugin = NotificationPlugin::new();
        let (user, token) = test_helpers::signed_in(&ctx, "Asha", GlobalRole::Student).await;
        let (_, other_token) = test_helpers::signed_in(&ctx, "Ravi", GlobalRole::Student).await;
        seed(&ctx, &user.id).await;
        let target = ctx
            .database
            .list_user_notifications(&user.id, false, 1, 0)
            .await
            .unwrap()
            .remove(0);

        let err = plugin
            .on_request(
                &post(
                    "/notification/mark-read",
                    &other_token,
                    serde_json::json!({ "notificationId": target.id }),
                ),
                &ctx,
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);

        let resp = plugin
            .on_request(
                &post(
                    "/notification/mark-read",
                    &token,
                    serde_json::json!({ "notificationId": target.id }),
                ),
                &ctx,
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_body(&resp)["notification"]["read"], true);

        let resp = plugin
            .on_request(&get("/notification/unread-count", Some(token.as_str()), &[]), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_body(&resp)["count"], 2);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let ctx = test_helpers::create_test_context();
        let plugin = NotificationPlugin::new();
        let (user, token) = test_helpers::signed_in(&ctx, "Asha", GlobalRole::Student).await;
        seed(&ctx, &user.id).await;

        let resp = plugin
            .on_request(&post("/notification/mark-all-read", &token, serde_json::json!({})), &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json_body(&resp)["count"], 3);

        let resp = plugin
            .on_request(
                &get("/notification/list", Some(token.as_str()), &[("unreadOnly", "true")]),
                &ctx,
            )
            .await
            .unwrap()
            .unwrap();
        assert!(json_body(&resp)["notifications"].as_array().unwrap().is_empty());
    }
}

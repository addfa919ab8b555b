use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use validator::Validate;

use clubhub_core::adapters::DatabaseAdapter;
use clubhub_core::password::{hash_password, validate_password, verify_password};
use clubhub_core::session::extract_bearer_token;
use clubhub_core::types::CreateUser;
use clubhub_core::{GlobalRole, HttpMethod, HubRequest, HubResponse, StatusResponse};
use clubhub_core::{HubContext, HubPlugin, HubRoute};
use clubhub_core::{HubError, HubResult, User};

use super::helpers::require_session;
use super::membership::memberships_with_club;
use super::membership::types::MembershipWithClub;

/// Sign-up, sign-in, sign-out and the current-user endpoint.
///
/// New accounts are always students; coordinators and admins are promoted
/// through `/admin/set-role`.
pub struct AccountPlugin {
    enable_signup: bool,
}

#[derive(Debug, Deserialize, Validate)]
struct SignUpRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    name: String,
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Debug, Deserialize, Validate)]
struct SignInRequest {
    #[validate(email(message = "Invalid email address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    user: User,
    token: String,
}

#[derive(Debug, Serialize)]
struct MeResponse {
    user: User,
    memberships: Vec<MembershipWithClub>,
}

impl AccountPlugin {
    pub fn new() -> Self {
        Self {
            enable_signup: true,
        }
    }

    pub fn enable_signup(mut self, enable: bool) -> Self {
        self.enable_signup = enable;
        self
    }

    async fn handle_sign_up<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        if !self.enable_signup {
            return Err(HubError::forbidden("User registration is not enabled"));
        }

        let body: SignUpRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };

        validate_password(&body.password, &ctx.config.password)?;

        if ctx.database.get_user_by_email(&body.email).await?.is_some() {
            return Err(HubError::conflict("A user with this email already exists"));
        }

        let user = ctx
            .database
            .create_user(CreateUser {
                name: body.name.trim().to_string(),
                email: body.email,
                password_hash: Some(hash_password(&body.password)?),
                role: GlobalRole::Student,
            })
            .await?;

        let session = ctx.session_manager().create_session(&user).await?;
        ctx.logger().info(&format!("User {} signed up", user.id));

        Ok(HubResponse::json(
            200,
            &SessionResponse {
                user,
                token: session.token,
            },
        )?)
    }

    async fn handle_sign_in<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let body: SignInRequest = match clubhub_core::validate_request_body(req) {
            Ok(v) => v,
            Err(resp) => return Ok(resp),
        };

        let user = ctx
            .database
            .get_user_by_email(&body.email)
            .await?
            .ok_or(HubError::InvalidCredentials)?;
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(HubError::InvalidCredentials)?;
        verify_password(&body.password, hash)?;

        let session = ctx.session_manager().create_session(&user).await?;

        Ok(HubResponse::json(
            200,
            &SessionResponse {
                user,
                token: session.token,
            },
        )?)
    }

    async fn handle_sign_out<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let token = extract_bearer_token(req).ok_or(HubError::Unauthenticated)?;
        ctx.session_manager().delete_session(token).await?;
        Ok(HubResponse::json(200, &StatusResponse { status: true })?)
    }

    async fn handle_me<DB: DatabaseAdapter>(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<HubResponse> {
        let (user, _session) = require_session(req, ctx).await?;

        let memberships = memberships_with_club(ctx, &user.id).await?;
        Ok(HubResponse::json(200, &MeResponse { user, memberships })?)
    }
}

impl Default for AccountPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<DB: DatabaseAdapter> HubPlugin<DB> for AccountPlugin {
    fn name(&self) -> &'static str {
        "account"
    }

    fn routes(&self) -> Vec<HubRoute> {
        vec![
            HubRoute::post("/sign-up", "sign_up"),
            HubRoute::post("/sign-in", "sign_in"),
            HubRoute::post("/sign-out", "sign_out"),
            HubRoute::get("/me", "me"),
        ]
    }

    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Post, "/sign-up") => Ok(Some(self.handle_sign_up(req, ctx).await?)),
            (HttpMethod::Post, "/sign-in") => Ok(Some(self.handle_sign_in(req, ctx).await?)),
            (HttpMethod::Post, "/sign-out") => Ok(Some(self.handle_sign_out(req, ctx).await?)),
            (HttpMethod::Get, "/me") => Ok(Some(self.handle_me(req, ctx).await?)),
            _ => Ok(None),
        }
    }
}

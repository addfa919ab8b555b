use std::sync::Arc;

use clubhub_api::plugins::{
    AccountPlugin, AdminPlugin, AuditPlugin, ClubPlugin, EventPlugin, MembershipPlugin,
    NotificationPlugin, ReportPlugin,
};
use clubhub_core::middleware::{
    self, BodyLimitConfig, BodyLimitMiddleware, Middleware, RateLimitConfig, RateLimitMiddleware,
};
use clubhub_core::{
    CacheAdapter, DatabaseAdapter, HealthCheckResponse, HttpMethod, HubConfig, HubContext,
    HubError, HubPlugin, HubRequest, HubResponse, HubResult, OkResponse, SessionManager,
};

use crate::scheduler::LifecycleScheduler;

/// The assembled ClubHub service, generic over the store.
pub struct Hub<DB: DatabaseAdapter> {
    config: Arc<HubConfig>,
    plugins: Vec<Box<dyn HubPlugin<DB>>>,
    middlewares: Vec<Box<dyn Middleware>>,
    context: HubContext<DB>,
}

/// Initial builder for configuring the hub.
///
/// Call `.database(adapter)` to obtain a [`TypedHubBuilder`] that accepts
/// plugins.
pub struct HubBuilder {
    config: HubConfig,
    rate_limit_config: Option<RateLimitConfig>,
    body_limit_config: Option<BodyLimitConfig>,
    cache: Option<Arc<dyn CacheAdapter>>,
    custom_middlewares: Vec<Box<dyn Middleware>>,
}

/// Typed builder returned by [`HubBuilder::database`].
pub struct TypedHubBuilder<DB: DatabaseAdapter> {
    config: HubConfig,
    database: Arc<DB>,
    plugins: Vec<Box<dyn HubPlugin<DB>>>,
    rate_limit_config: Option<RateLimitConfig>,
    body_limit_config: Option<BodyLimitConfig>,
    cache: Option<Arc<dyn CacheAdapter>>,
    custom_middlewares: Vec<Box<dyn Middleware>>,
}

impl HubBuilder {
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            rate_limit_config: None,
            body_limit_config: None,
            cache: None,
            custom_middlewares: Vec::new(),
        }
    }

    /// Set the store, returning a [`TypedHubBuilder`].
    pub fn database<DB: DatabaseAdapter>(self, database: DB) -> TypedHubBuilder<DB> {
        TypedHubBuilder {
            config: self.config,
            database: Arc::new(database),
            plugins: Vec::new(),
            rate_limit_config: self.rate_limit_config,
            body_limit_config: self.body_limit_config,
            cache: self.cache,
            custom_middlewares: self.custom_middlewares,
        }
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = Some(config);
        self
    }

    pub fn body_limit(mut self, config: BodyLimitConfig) -> Self {
        self.body_limit_config = Some(config);
        self
    }

    pub fn cache<C: CacheAdapter + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }
}

impl<DB: DatabaseAdapter> TypedHubBuilder<DB> {
    /// Add a plugin. Plugins are consulted in registration order.
    pub fn plugin<P: HubPlugin<DB> + 'static>(mut self, plugin: P) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Register every ClubHub plugin with its default configuration.
    pub fn default_plugins(self) -> Self {
        self.plugin(AccountPlugin::new())
            .plugin(AdminPlugin::new())
            .plugin(ClubPlugin::new())
            .plugin(MembershipPlugin::new())
            .plugin(EventPlugin::new())
            .plugin(NotificationPlugin::new())
            .plugin(AuditPlugin::new())
            .plugin(ReportPlugin::new())
    }

    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit_config = Some(config);
        self
    }

    pub fn body_limit(mut self, config: BodyLimitConfig) -> Self {
        self.body_limit_config = Some(config);
        self
    }

    /// Add a custom middleware, run after the built-in ones.
    pub fn middleware<M: Middleware + 'static>(mut self, mw: M) -> Self {
        self.custom_middlewares.push(Box::new(mw));
        self
    }

    pub async fn build(self) -> HubResult<Hub<DB>> {
        self.config.validate()?;

        let config = Arc::new(self.config);
        let mut context = HubContext::new(config.clone(), self.database);
        if let Some(cache) = self.cache {
            context = context.with_cache(cache);
        }

        for plugin in &self.plugins {
            plugin.on_init(&context).await?;
        }

        // Order matters: body limit, then rate limit, then custom
        let mut middlewares: Vec<Box<dyn Middleware>> = vec![
            Box::new(BodyLimitMiddleware::new(
                self.body_limit_config.unwrap_or_default(),
            )),
            Box::new(RateLimitMiddleware::new(
                self.rate_limit_config.unwrap_or_default(),
            )),
        ];
        middlewares.extend(self.custom_middlewares);

        config.logger.info(&format!(
            "Hub ready with plugins: {}",
            self.plugins
                .iter()
                .map(|p| p.name())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        Ok(Hub {
            config,
            plugins: self.plugins,
            middlewares,
            context,
        })
    }
}

impl<DB: DatabaseAdapter> Hub<DB> {
    #[allow(clippy::new_ret_no_self)]
    pub fn new(config: HubConfig) -> HubBuilder {
        HubBuilder::new(config)
    }

    /// Handle a request.
    ///
    /// Errors from plugins are converted into `{ "message": "..." }`
    /// responses via [`HubError::into_response`].
    pub async fn handle_request(&self, req: HubRequest) -> HubResponse {
        match self.handle_request_inner(&req).await {
            Ok(response) => response,
            Err(err) => {
                if err.status_code() >= 500 {
                    self.config.logger.error(&format!(
                        "{:?} {} failed: {}",
                        req.method,
                        req.path,
                        err
                    ));
                }
                err.into_response()
            }
        }
    }

    async fn handle_request_inner(&self, req: &HubRequest) -> HubResult<HubResponse> {
        if let Some(response) = middleware::run_before(&self.middlewares, req).await? {
            return Ok(response);
        }

        if self.config.is_path_disabled(req.path()) {
            return Err(HubError::not_found("No handler found for this request"));
        }

        if let Some(response) = self.handle_core_request(req)? {
            return Ok(response);
        }

        for plugin in &self.plugins {
            if let Some(response) = plugin.on_request(req, &self.context).await? {
                return Ok(response);
            }
        }

        Err(HubError::not_found("No handler found for this request"))
    }

    fn handle_core_request(&self, req: &HubRequest) -> HubResult<Option<HubResponse>> {
        match (req.method(), req.path()) {
            (HttpMethod::Get, "/ok") => Ok(Some(HubResponse::json(200, &OkResponse { ok: true })?)),
            (HttpMethod::Get, "/health") => Ok(Some(HubResponse::json(
                200,
                &HealthCheckResponse {
                    status: "ok",
                    service: self.config.app_name.clone(),
                },
            )?)),
            _ => Ok(None),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn database(&self) -> &Arc<DB> {
        &self.context.database
    }

    pub fn context(&self) -> &HubContext<DB> {
        &self.context
    }

    pub fn session_manager(&self) -> SessionManager<DB> {
        self.context.session_manager()
    }

    /// A lifecycle scheduler sharing this hub's store, cache and config.
    pub fn scheduler(&self) -> LifecycleScheduler<DB> {
        LifecycleScheduler::new(self.context.clone())
    }

    /// Every plugin route as `(method, path)`.
    pub fn routes(&self) -> Vec<(HttpMethod, String)> {
        self.plugins
            .iter()
            .flat_map(|p| p.routes())
            .map(|r| (r.method, r.path))
            .collect()
    }

    pub fn plugins(&self) -> &[Box<dyn HubPlugin<DB>>] {
        &self.plugins
    }

    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }
}

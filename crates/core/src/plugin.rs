use async_trait::async_trait;
use std::sync::Arc;

use crate::adapters::{CacheAdapter, DatabaseAdapter, MemoryCacheAdapter};
use crate::audit::AuditRecorder;
use crate::config::HubConfig;
use crate::error::HubResult;
use crate::logger::Logger;
use crate::notify::Notifier;
use crate::session::SessionManager;
use crate::types::{HttpMethod, HubRequest, HubResponse};

/// A group of related routes served by the hub.
///
/// Generic over `DB` so plugins run against any store implementing
/// [`DatabaseAdapter`].
#[async_trait]
pub trait HubPlugin<DB: DatabaseAdapter>: Send + Sync {
    /// Plugin name - should be unique
    fn name(&self) -> &'static str;

    /// Routes that this plugin handles
    fn routes(&self) -> Vec<HubRoute>;

    /// Called once when the hub is built
    async fn on_init(&self, ctx: &HubContext<DB>) -> HubResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Return `Some(response)` to handle the request, `None` to pass.
    async fn on_request(
        &self,
        req: &HubRequest,
        ctx: &HubContext<DB>,
    ) -> HubResult<Option<HubResponse>>;
}

/// Route definition for plugins
#[derive(Debug, Clone)]
pub struct HubRoute {
    pub path: String,
    pub method: HttpMethod,
    /// Stable identifier for the route, used in logs.
    pub operation_id: String,
}

impl HubRoute {
    pub fn new(
        method: HttpMethod,
        path: impl Into<String>,
        operation_id: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            operation_id: operation_id.into(),
        }
    }

    pub fn get(path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path, operation_id)
    }

    pub fn post(path: impl Into<String>, operation_id: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path, operation_id)
    }
}

/// Shared state handed to every plugin call.
pub struct HubContext<DB: DatabaseAdapter> {
    pub config: Arc<HubConfig>,
    pub database: Arc<DB>,
    pub cache: Arc<dyn CacheAdapter>,
}

impl<DB: DatabaseAdapter> Clone for HubContext<DB> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            database: self.database.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<DB: DatabaseAdapter> HubContext<DB> {
    pub fn new(config: Arc<HubConfig>, database: Arc<DB>) -> Self {
        Self {
            config,
            database,
            cache: Arc::new(MemoryCacheAdapter::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheAdapter>) -> Self {
        self.cache = cache;
        self
    }

    pub fn logger(&self) -> &dyn Logger {
        self.config.logger.as_ref()
    }

    pub fn session_manager(&self) -> SessionManager<DB> {
        SessionManager::new(self.config.clone(), self.database.clone())
    }

    pub fn notifier(&self) -> Notifier<'_, DB> {
        Notifier::new(
            self.database.as_ref(),
            self.config.notification_dedup_window,
            self.logger(),
        )
    }

    pub fn audit(&self) -> AuditRecorder<'_, DB> {
        AuditRecorder::new(self.database.as_ref(), self.logger())
    }
}

use super::Middleware;
use crate::error::HubResult;
use crate::types::{CodeMessageResponse, HubRequest, HubResponse};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct BodyLimitConfig {
    /// Maximum body size in bytes. Defaults to 64 KiB.
    pub max_bytes: usize,
    pub enabled: bool,
}

impl Default for BodyLimitConfig {
    fn default() -> Self {
        Self {
            max_bytes: 64 * 1024,
            enabled: true,
        }
    }
}

impl BodyLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = max;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Rejects requests whose body exceeds the configured size with 413.
pub struct BodyLimitMiddleware {
    config: BodyLimitConfig,
}

impl BodyLimitMiddleware {
    pub fn new(config: BodyLimitConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Middleware for BodyLimitMiddleware {
    fn name(&self) -> &'static str {
        "body-limit"
    }

    async fn before_request(&self, req: &HubRequest) -> HubResult<Option<HubResponse>> {
        if !self.config.enabled {
            return Ok(None);
        }

        match &req.body {
            Some(body) if body.len() > self.config.max_bytes => Ok(Some(HubResponse::json(
                413,
                &CodeMessageResponse {
                    code: "BODY_TOO_LARGE",
                    message: format!(
                        "Request body exceeds maximum size of {} bytes",
                        self.config.max_bytes
                    ),
                },
            )?)),
            _ => Ok(None),
        }
    }
}

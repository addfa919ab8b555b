use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::Middleware;
use crate::error::{HubResult, StoreError};
use crate::types::{HubRequest, HubResponse, RateLimitErrorResponse};

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Limit applied to every path without an override.
    pub default: EndpointRateLimit,

    /// Per-path overrides, keyed by exact path.
    pub per_endpoint: HashMap<String, EndpointRateLimit>,

    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct EndpointRateLimit {
    pub window: Duration,
    pub max_requests: u32,
}

impl EndpointRateLimit {
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let mut per_endpoint = HashMap::new();
        per_endpoint.insert("/sign-in".to_string(), EndpointRateLimit::per_minute(10));
        per_endpoint.insert("/sign-up".to_string(), EndpointRateLimit::per_minute(5));
        per_endpoint.insert(
            "/membership/apply".to_string(),
            EndpointRateLimit::per_minute(10),
        );

        Self {
            default: EndpointRateLimit::per_minute(120),
            per_endpoint,
            enabled: true,
        }
    }
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_limit(mut self, window: Duration, max_requests: u32) -> Self {
        self.default = EndpointRateLimit {
            window,
            max_requests,
        };
        self
    }

    pub fn endpoint(
        mut self,
        path: impl Into<String>,
        window: Duration,
        max_requests: u32,
    ) -> Self {
        self.per_endpoint.insert(
            path.into(),
            EndpointRateLimit {
                window,
                max_requests,
            },
        );
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// In-process sliding-window rate limiter.
///
/// Clients are identified by their forwarded address, falling back to the
/// bearer token on paths without an override.
pub struct RateLimitMiddleware {
    config: RateLimitConfig,
    buckets: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimitMiddleware {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    fn client_address(req: &HubRequest) -> Option<&str> {
        req.header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .or_else(|| req.header("x-real-ip").map(String::as_str))
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    }

    /// Bucket owner for `req`.
    ///
    /// Tokens are not validated here, so they only separate clients with no
    /// known address, and never on paths with their own limit.
    fn client_key(&self, req: &HubRequest) -> String {
        if let Some(ip) = Self::client_address(req) {
            return format!("ip:{}", ip);
        }
        if self.config.per_endpoint.contains_key(&req.path) {
            return "anonymous".to_string();
        }
        req.header("authorization")
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(|token| format!("token:{}", token))
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn limit_for_path(&self, path: &str) -> &EndpointRateLimit {
        self.config
            .per_endpoint
            .get(path)
            .unwrap_or(&self.config.default)
    }
}

#[async_trait]
impl Middleware for RateLimitMiddleware {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    async fn before_request(&self, req: &HubRequest) -> HubResult<Option<HubResponse>> {
        if !self.config.enabled {
            return Ok(None);
        }

        let limit = self.limit_for_path(&req.path);
        let key = format!("{}:{}", self.client_key(req), req.path);
        let now = Instant::now();
        let window = limit.window;

        let mut buckets = self
            .buckets
            .lock()
            .map_err(|_| StoreError::Connection("rate limiter lock poisoned".to_string()))?;
        let timestamps = buckets.entry(key).or_default();
        timestamps.retain(|&t| now.duration_since(t) < window);

        if timestamps.len() as u32 >= limit.max_requests {
            let retry_after = timestamps
                .first()
                .map(|&t| window.saturating_sub(now.duration_since(t)).as_secs().max(1))
                .unwrap_or(window.as_secs());

            return Ok(Some(
                HubResponse::json(
                    429,
                    &RateLimitErrorResponse {
                        code: "RATE_LIMIT_EXCEEDED",
                        message: "Too many requests",
                        retry_after,
                    },
                )?
                .with_header("Retry-After", retry_after.to_string()),
            ));
        }

        timestamps.push(now);
        Ok(None)
    }
}

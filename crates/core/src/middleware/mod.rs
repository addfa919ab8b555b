pub mod body_limit;
pub mod rate_limit;

use crate::error::HubResult;
use crate::types::{HubRequest, HubResponse};
use async_trait::async_trait;

/// Request filter run before plugin dispatch.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &'static str;

    /// Return `Ok(Some(response))` to reject the request, `Ok(None)` to let
    /// it through.
    async fn before_request(&self, req: &HubRequest) -> HubResult<Option<HubResponse>>;
}

/// Run a middleware chain in order, stopping at the first rejection.
pub async fn run_before(
    middlewares: &[Box<dyn Middleware>],
    req: &HubRequest,
) -> HubResult<Option<HubResponse>> {
    for mw in middlewares {
        if let Some(response) = mw.before_request(req).await? {
            return Ok(Some(response));
        }
    }
    Ok(None)
}

pub use body_limit::{BodyLimitConfig, BodyLimitMiddleware};
pub use rate_limit::{EndpointRateLimit, RateLimitConfig, RateLimitMiddleware};

//! # ClubHub
//!
//! Backend for running student clubs: role-based permissions, membership
//! role rules, and an event lifecycle with a clock-driven scheduler.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clubhub::{Hub, HubConfig};
//! use clubhub::adapters::MemoryDatabaseAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Hub::<MemoryDatabaseAdapter>::new(HubConfig::new())
//!         .database(MemoryDatabaseAdapter::new())
//!         .default_plugins()
//!         .build()
//!         .await?;
//!
//!     let scheduler = hub.scheduler().start();
//!     # scheduler.abort();
//!     Ok(())
//! }
//! ```

// The hub lives in the root crate because it wires plugins from
// clubhub-api onto the abstractions in clubhub-core
pub mod config;
pub mod core;
pub mod handlers;
pub mod scheduler;

pub use clubhub_core::{
    Action, AuditLog, BodyLimitConfig, BodyLimitMiddleware, CacheAdapter, Club, ClubCategory,
    ClubRole, ClubStatus, CompletionChecklist, DatabaseAdapter, EndpointRateLimit, Event,
    EventConfig, EventStatus, GlobalRole, HttpMethod, HubConfig, HubContext, HubError, HubPlugin,
    HubRequest, HubResponse, HubResult, HubRoute, Logger, Membership, MembershipConfig,
    MembershipStatus, MemoryLogger, Middleware, Notification, NotificationKind, PasswordConfig,
    RateLimitConfig, RateLimitMiddleware, Resource, SYSTEM_ACTOR, Session, SessionConfig,
    SessionManager, StoreError, TracingLogger, Transition, User,
};
pub use clubhub_core::{lifecycle, rbac, roles};

pub mod types {
    pub use clubhub_core::types::*;
}

pub mod adapters {
    pub use clubhub_core::adapters::{
        AuditOps, CacheAdapter, ClubOps, DatabaseAdapter, EventOps, MembershipOps,
        MemoryCacheAdapter, MemoryDatabaseAdapter, NotificationOps, SessionOps, UserOps,
    };
}

pub mod plugins {
    pub use clubhub_api::plugins::*;
}

pub use clubhub_api::bootstrap_admin;
pub use core::{Hub, HubBuilder, TypedHubBuilder};
pub use scheduler::{CycleReport, LifecycleScheduler};

#[cfg(feature = "axum")]
pub use handlers::AxumIntegration;

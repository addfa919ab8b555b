//! # ClubHub Core
//!
//! Domain types, the permission and role rules, the event state machine,
//! the store traits with an in-memory implementation, and the plugin
//! abstractions shared by the ClubHub crates.

pub mod adapters;
pub mod audit;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logger;
pub mod middleware;
pub mod notify;
pub mod password;
pub mod plugin;
pub mod rbac;
pub mod roles;
pub mod session;
pub mod types;

pub use adapters::{
    AuditOps, CacheAdapter, ClubOps, DatabaseAdapter, EventOps, MembershipOps,
    MemoryCacheAdapter, MemoryDatabaseAdapter, NotificationOps, SessionOps, UserOps,
};
pub use audit::{AuditRecorder, SYSTEM_ACTOR};
pub use config::{EventConfig, HubConfig, MembershipConfig, PasswordConfig, SessionConfig};
pub use error::{
    HubError, HubResult, StoreError, validate_request_body, validation_error_response,
};
pub use lifecycle::{ChecklistUpdate, CompletionChecklist, EventStatus, Outcome, Transition};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use middleware::{
    BodyLimitConfig, BodyLimitMiddleware, EndpointRateLimit, Middleware, RateLimitConfig,
    RateLimitMiddleware,
};
pub use notify::Notifier;
pub use plugin::{HubContext, HubPlugin, HubRoute};
pub use rbac::{Action, ClubRole, ClubScope, Decision, GlobalRole, Grant, Resource, RoleTier};
pub use roles::{RoleChange, RoleChangeRequest};
pub use session::SessionManager;
pub use types::{
    Approval, AuditLog, Club, ClubCategory, ClubStatus, CodeMessageResponse, ErrorMessageResponse,
    Event, HealthCheckResponse, HttpMethod, HubRequest, HubResponse, Membership, MembershipStatus,
    Notification, NotificationKind, OkResponse, RateLimitErrorResponse, Session, StatusResponse,
    User, ValidationErrorResponse,
};

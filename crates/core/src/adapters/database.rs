pub use super::traits::{
    AuditOps, ClubOps, EventOps, MembershipOps, NotificationOps, SessionOps, UserOps,
};

/// Database adapter trait for persistence.
///
/// Combines all entity-specific operation traits. Any type that implements
/// all sub-traits (`UserOps`, `ClubOps`, etc.) automatically implements
/// `DatabaseAdapter` via the blanket impl.
///
/// Use the sub-traits directly when you only need a subset of operations
/// (the notifier only needs `NotificationOps`, the audit recorder only
/// `AuditOps`).
pub trait DatabaseAdapter:
    UserOps + SessionOps + ClubOps + MembershipOps + EventOps + NotificationOps + AuditOps
{
}

impl<T> DatabaseAdapter for T where
    T: UserOps + SessionOps + ClubOps + MembershipOps + EventOps + NotificationOps + AuditOps
{
}

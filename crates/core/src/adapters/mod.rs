pub mod cache;
pub mod database;
pub mod memory;
pub mod traits;

pub use cache::{CacheAdapter, MemoryCacheAdapter};
pub use database::{
    AuditOps, ClubOps, DatabaseAdapter, EventOps, MembershipOps, NotificationOps, SessionOps,
    UserOps,
};
pub use memory::MemoryDatabaseAdapter;

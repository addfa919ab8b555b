pub mod account;
pub mod admin;
pub mod audit;
pub mod club;
pub mod event;
pub(crate) mod helpers;
pub mod membership;
pub mod notification;
pub mod report;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use account::AccountPlugin;
pub use admin::{AdminConfig, AdminPlugin, bootstrap_admin};
pub use audit::AuditPlugin;
pub use club::ClubPlugin;
pub use event::{EventPlugin, EventPluginConfig};
pub use membership::MembershipPlugin;
pub use notification::NotificationPlugin;
pub use report::ReportPlugin;

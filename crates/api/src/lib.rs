//! # ClubHub API
//!
//! Route plugins for the ClubHub server: accounts, administration, clubs,
//! memberships, events, notifications, the audit trail and reports.

pub mod plugins;

pub use plugins::account::AccountPlugin;
pub use plugins::admin::{AdminConfig, AdminPlugin, bootstrap_admin};
pub use plugins::audit::AuditPlugin;
pub use plugins::club::ClubPlugin;
pub use plugins::event::{EventPlugin, EventPluginConfig};
pub use plugins::membership::MembershipPlugin;
pub use plugins::notification::NotificationPlugin;
pub use plugins::report::ReportPlugin;

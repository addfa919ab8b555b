//! Route tables and dispatch agree across every plugin.

use std::collections::HashSet;
use std::sync::Arc;

use clubhub_api::plugins::{
    AccountPlugin, AdminPlugin, AuditPlugin, ClubPlugin, EventPlugin, MembershipPlugin,
    NotificationPlugin, ReportPlugin,
};
use clubhub_core::{HubConfig, HubContext, HubPlugin, HubRequest, MemoryDatabaseAdapter};

fn all_plugins() -> Vec<Box<dyn HubPlugin<MemoryDatabaseAdapter>>> {
    vec![
        Box::new(AccountPlugin::new()),
        Box::new(AdminPlugin::new()),
        Box::new(ClubPlugin::new()),
        Box::new(MembershipPlugin::new()),
        Box::new(EventPlugin::new()),
        Box::new(NotificationPlugin::new()),
        Box::new(AuditPlugin::new()),
        Box::new(ReportPlugin::new()),
    ]
}

#[test]
fn test_routes_are_unique_across_plugins() {
    let mut seen = HashSet::new();
    for plugin in all_plugins() {
        for route in plugin.routes() {
            let key = format!("{:?} {}", route.method, route.path);
            assert!(seen.insert(key.clone()), "{key} registered twice");
        }
    }
}

#[tokio::test]
async fn test_each_route_is_claimed_only_by_its_plugin() {
    let ctx = HubContext::new(
        Arc::new(HubConfig::default()),
        Arc::new(MemoryDatabaseAdapter::new()),
    );
    let plugins = all_plugins();

    for owner in &plugins {
        for route in owner.routes() {
            let req = HubRequest::new(route.method.clone(), route.path.clone());
            for plugin in &plugins {
                // Without a session the owner answers or fails; nobody else claims it
                let claimed = !matches!(plugin.on_request(&req, &ctx).await, Ok(None));
                assert_eq!(
                    claimed,
                    plugin.name() == owner.name(),
                    "{} claimed {:?} {}",
                    plugin.name(),
                    route.method,
                    route.path
                );
            }
        }
    }
}

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use clubhub::adapters::MemoryDatabaseAdapter;
use clubhub::config::ServerConfig;
use clubhub::handlers::AxumIntegration;
use clubhub::{Hub, HubConfig, RateLimitConfig};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let server = ServerConfig::load()?;

    let config = HubConfig::new()
        .app_name(server.app_name.clone())
        .scheduler_interval(server.scheduler_interval);

    let hub = Arc::new(
        Hub::<MemoryDatabaseAdapter>::new(config)
            .database(MemoryDatabaseAdapter::new())
            .rate_limit(RateLimitConfig::default())
            .default_plugins()
            .build()
            .await?,
    );
    info!(plugins = ?hub.plugin_names(), "Hub built");

    match &server.admin {
        Some(seed) => {
            let admin =
                clubhub_api::bootstrap_admin(hub.context(), &seed.name, &seed.email, &seed.password)
                    .await?;
            info!(user_id = %admin.id, email = %admin.email, "Administrator ready");
        }
        None => info!("CLUBHUB_ADMIN_EMAIL not set; no administrator seeded"),
    }

    let scheduler = hub.scheduler().start();

    let app = Router::new()
        .route(
            "/",
            get(|| async { Json(json!({ "service": "clubhub", "api": "/api" })) }),
        )
        .nest("/api", hub.clone().axum_router())
        .with_state(hub);

    let listener = TcpListener::bind(("0.0.0.0", server.port)).await?;
    info!(port = server.port, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.abort();
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

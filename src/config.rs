//! Process settings read from the environment by the server binary.

use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use clubhub_core::{HubError, HubResult};

/// Credentials for the administrator created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub app_name: String,
    pub scheduler_interval: Duration,
    pub admin: Option<AdminSeed>,
}

impl ServerConfig {
    pub fn load() -> HubResult<Self> {
        let interval_secs: u64 = try_load("CLUBHUB_SCHEDULER_INTERVAL_SECS", "60")?;
        if interval_secs == 0 {
            return Err(HubError::config(
                "CLUBHUB_SCHEDULER_INTERVAL_SECS must be positive",
            ));
        }

        let admin = match (var("CLUBHUB_ADMIN_EMAIL"), var("CLUBHUB_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: var("CLUBHUB_ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            (None, None) => None,
            _ => {
                return Err(HubError::config(
                    "CLUBHUB_ADMIN_EMAIL and CLUBHUB_ADMIN_PASSWORD must be set together",
                ));
            }
        };

        Ok(Self {
            port: try_load("CLUBHUB_PORT", "3000")?,
            app_name: try_load("CLUBHUB_APP_NAME", "ClubHub")?,
            scheduler_interval: Duration::from_secs(interval_secs),
            admin,
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn try_load<T: FromStr>(key: &str, default: &str) -> HubResult<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            HubError::config(format!("Invalid {key} value: {e}"))
        })
}

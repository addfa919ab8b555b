use crate::error::HubError;
use crate::logger::{Logger, TracingLogger};
use chrono::Duration;
use std::sync::Arc;

/// Main configuration for a ClubHub instance.
#[derive(Clone)]
pub struct HubConfig {
    /// Application name, reported by `/health`.
    ///
    /// Defaults to `"ClubHub"`.
    pub app_name: String,

    /// Paths that should be disabled (skipped) by the router.
    pub disabled_paths: Vec<String>,

    /// Logger used by the hub and its plugins.
    ///
    /// Defaults to a [`TracingLogger`](crate::logger::TracingLogger).
    pub logger: Arc<dyn Logger>,

    /// Session configuration
    pub session: SessionConfig,

    /// Password policy
    pub password: PasswordConfig,

    /// Membership rules
    pub membership: MembershipConfig,

    /// Event lifecycle timings and approval thresholds
    pub events: EventConfig,

    /// Notification deduplication window
    pub notification_dedup_window: Duration,

    /// TTL of cached club listings and club details
    pub cache_ttl: Duration,
}

/// Session-specific configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session expiration duration
    pub expires_in: Duration,

    /// Extend the session on activity
    pub update_age: bool,
}

/// Password policy
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub max_length: usize,
}

#[derive(Debug, Clone)]
pub struct MembershipConfig {
    /// Upper bound on clubs a student may belong to (pending + approved at
    /// application time, approved at approval time).
    pub max_club_memberships: usize,
}

#[derive(Debug, Clone)]
pub struct EventConfig {
    /// Budgets strictly above this amount need admin approval after the
    /// coordinator signs off.
    pub admin_approval_budget_threshold: u64,

    /// Time after the event ends within which the completion checklist
    /// must be finished.
    pub completion_window: Duration,

    /// Start sending completion reminders when the deadline is this close.
    pub completion_reminder_window: Duration,

    /// Tick of the lifecycle scheduler.
    pub scheduler_interval: std::time::Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            app_name: "ClubHub".to_string(),
            disabled_paths: Vec::new(),
            logger: Arc::new(TracingLogger),
            session: SessionConfig::default(),
            password: PasswordConfig::default(),
            membership: MembershipConfig::default(),
            events: EventConfig::default(),
            notification_dedup_window: Duration::hours(1),
            cache_ttl: Duration::minutes(5),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expires_in: Duration::days(7),
            update_age: true,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            max_club_memberships: 3,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            admin_approval_budget_threshold: 10_000,
            completion_window: Duration::days(7),
            completion_reminder_window: Duration::hours(48),
            scheduler_interval: std::time::Duration::from_secs(60),
        }
    }
}

impl HubConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Add a path to the disabled paths list.
    pub fn disabled_path(mut self, path: impl Into<String>) -> Self {
        self.disabled_paths.push(path.into());
        self
    }

    /// Set a custom logger implementation.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn session_expires_in(mut self, duration: Duration) -> Self {
        self.session.expires_in = duration;
        self
    }

    pub fn password_min_length(mut self, length: usize) -> Self {
        self.password.min_length = length;
        self
    }

    pub fn max_club_memberships(mut self, max: usize) -> Self {
        self.membership.max_club_memberships = max;
        self
    }

    pub fn admin_approval_budget_threshold(mut self, amount: u64) -> Self {
        self.events.admin_approval_budget_threshold = amount;
        self
    }

    pub fn completion_window(mut self, window: Duration) -> Self {
        self.events.completion_window = window;
        self
    }

    pub fn completion_reminder_window(mut self, window: Duration) -> Self {
        self.events.completion_reminder_window = window;
        self
    }

    pub fn scheduler_interval(mut self, interval: std::time::Duration) -> Self {
        self.events.scheduler_interval = interval;
        self
    }

    pub fn notification_dedup_window(mut self, window: Duration) -> Self {
        self.notification_dedup_window = window;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Check whether a given path is disabled.
    pub fn is_path_disabled(&self, path: &str) -> bool {
        self.disabled_paths.iter().any(|disabled| disabled == path)
    }

    pub fn validate(&self) -> Result<(), HubError> {
        if self.membership.max_club_memberships == 0 {
            return Err(HubError::config(
                "max_club_memberships must be at least 1",
            ));
        }

        if self.password.min_length > self.password.max_length {
            return Err(HubError::config(
                "Password min length exceeds max length",
            ));
        }

        if self.events.completion_reminder_window > self.events.completion_window {
            return Err(HubError::config(
                "Completion reminder window cannot exceed the completion window",
            ));
        }

        if self.events.scheduler_interval.is_zero() {
            return Err(HubError::config("Scheduler interval cannot be zero"));
        }

        Ok(())
    }
}

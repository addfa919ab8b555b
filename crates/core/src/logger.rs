//! Logging abstraction for ClubHub.
//!
//! The hub and its plugins log through a [`Logger`] held in
//! [`HubConfig`](crate::config::HubConfig). The default [`TracingLogger`]
//! forwards to the [`tracing`] crate; tests swap in a recording logger.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Logging sink for request-level events (role changes, transitions,
/// dropped notifications).
pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn debug(&self, message: &str);
}

impl fmt::Debug for dyn Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn Logger")
    }
}

/// Default logger, delegating to `tracing` under the `clubhub` target.
#[derive(Debug, Clone)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "clubhub", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "clubhub", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "clubhub", "{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "clubhub", "{}", message);
    }
}

pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

/// Logger that keeps every line in memory, prefixed with its level.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    fn push(&self, level: &str, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format!("[{}] {}", level, message));
        }
    }
}

impl Logger for MemoryLogger {
    fn info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn error(&self, message: &str) {
        self.push("ERROR", message);
    }

    fn debug(&self, message: &str) {
        self.push("DEBUG", message);
    }
}

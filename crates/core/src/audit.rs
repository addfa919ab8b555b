//! Append-only audit trail.

use serde_json::Value;

use crate::adapters::AuditOps;
use crate::logger::Logger;
use crate::types::CreateAuditLog;

/// Actor recorded for transitions applied by the lifecycle scheduler.
pub const SYSTEM_ACTOR: &str = "system:scheduler";

impl CreateAuditLog {
    pub fn new(
        actor_id: impl Into<String>,
        action: impl Into<String>,
        target_type: impl Into<String>,
        target_id: impl Into<String>,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            action: action.into(),
            target_type: target_type.into(),
            target_id: target_id.into(),
            club_id: None,
            details: Value::Object(Default::default()),
        }
    }

    pub fn club(mut self, club_id: impl Into<String>) -> Self {
        self.club_id = Some(club_id.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}

pub struct AuditRecorder<'a, DB: ?Sized> {
    database: &'a DB,
    logger: &'a dyn Logger,
}

impl<'a, DB: AuditOps + ?Sized> AuditRecorder<'a, DB> {
    pub fn new(database: &'a DB, logger: &'a dyn Logger) -> Self {
        Self { database, logger }
    }

    /// Append an entry. A failed append is logged, never returned.
    pub async fn record(&self, entry: CreateAuditLog) {
        let action = entry.action.clone();
        let target = entry.target_id.clone();
        if let Err(e) = self.database.append_audit_log(entry).await {
            self.logger.error(&format!(
                "Failed to write audit log {} for {}: {}",
                action, target, e
            ));
        }
    }
}

//! Deduplicated user notifications.

use chrono::{Duration, Utc};

use crate::adapters::NotificationOps;
use crate::error::HubResult;
use crate::logger::Logger;
use crate::types::{CreateNotification, Notification, NotificationKind};

impl CreateNotification {
    pub fn new(
        user_id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            link: None,
        }
    }

    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    /// Same notification addressed to another user.
    pub fn for_user(&self, user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..self.clone()
        }
    }
}

/// Creates notifications, skipping any that repeat a (user, kind) pair
/// within the dedup window.
pub struct Notifier<'a, DB: ?Sized> {
    database: &'a DB,
    dedup_window: Duration,
    logger: &'a dyn Logger,
}

impl<'a, DB: NotificationOps + ?Sized> Notifier<'a, DB> {
    pub fn new(database: &'a DB, dedup_window: Duration, logger: &'a dyn Logger) -> Self {
        Self {
            database,
            dedup_window,
            logger,
        }
    }

    /// Returns `None` when an equivalent notification was sent recently.
    pub async fn notify(
        &self,
        notification: CreateNotification,
    ) -> HubResult<Option<Notification>> {
        let since = Utc::now() - self.dedup_window;
        if self
            .database
            .find_recent_notification(&notification.user_id, notification.kind, since)
            .await?
            .is_some()
        {
            self.logger.debug(&format!(
                "Skipping duplicate {:?} notification for user {}",
                notification.kind, notification.user_id
            ));
            return Ok(None);
        }

        self.database.create_notification(notification).await.map(Some)
    }

    /// Fire-and-forget variant; failures are logged and swallowed.
    ///
    /// Returns whether a notification was stored.
    pub async fn notify_quietly(&self, notification: CreateNotification) -> bool {
        let user_id = notification.user_id.clone();
        let kind = notification.kind;
        match self.notify(notification).await {
            Ok(created) => created.is_some(),
            Err(e) => {
                self.logger.warn(&format!(
                    "Failed to deliver {:?} notification to user {}: {}",
                    kind, user_id, e
                ));
                false
            }
        }
    }

    /// Send `notification` to every user in `user_ids`, skipping repeats.
    /// Returns how many notifications were stored.
    pub async fn notify_all_quietly<I, S>(
        &self,
        user_ids: I,
        notification: &CreateNotification,
    ) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::HashSet::new();
        let mut delivered = 0;
        for user_id in user_ids {
            let user_id = user_id.as_ref();
            if seen.insert(user_id.to_string())
                && self.notify_quietly(notification.for_user(user_id)).await
            {
                delivered += 1;
            }
        }
        delivered
    }
}

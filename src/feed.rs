//! Per-session view of one user's notifications.
//!
//! A [`NotificationFeed`] is a cached, possibly stale copy of the store. It is
//! refreshed on a fixed interval and on demand, receives pushed rows from the
//! hub, and mirrors read-state changes only after the store acknowledged them.
//! Nothing in here returns an error: failures are logged and the view degrades
//! (empty list, stale count) instead.

use crate::config::feed::FeedConfig;
use crate::models::NotificationModel;
use crate::services::notification::{MarkAllOutcome, NotificationService};
use sea_orm::prelude::DateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedSnapshot {
    pub items: Vec<NotificationModel>,
    pub unread: u64,
}

pub struct NotificationFeed {
    service: NotificationService,
    user_id: i32,
    config: FeedConfig,
    items: Vec<NotificationModel>,
    unread: u64,
}

impl NotificationFeed {
    pub fn new(service: NotificationService, user_id: i32, config: FeedConfig) -> Self {
        Self {
            service,
            user_id,
            config,
            items: Vec::new(),
            unread: 0,
        }
    }

    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn items(&self) -> &[NotificationModel] {
        &self.items
    }

    pub fn unread(&self) -> u64 {
        self.unread
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            unread: self.unread,
        }
    }

    /// Reload the list and the unread badge.
    pub async fn refresh(&mut self) {
        match self.service.list(self.user_id, self.config.limit).await {
            Ok(items) => self.items = items,
            Err(e) => {
                tracing::error!(user_id = self.user_id, "failed to load notifications: {e}");
                self.items.clear();
            }
        }

        match self.service.count_unread(self.user_id).await {
            Ok(count) => self.unread = count,
            Err(e) => {
                tracing::warn!(user_id = self.user_id, "failed to count unread notifications: {e}");
            }
        }
    }

    /// Returns whether the store acknowledged the change.
    pub async fn mark_read(&mut self, id: i32) -> bool {
        match self.service.mark_read(id, self.user_id).await {
            Ok(receipt) => {
                self.mirror_read(id, receipt.read_at);
                true
            }
            Err(e) => {
                tracing::warn!(user_id = self.user_id, notification_id = id, "failed to mark notification read: {e}");
                false
            }
        }
    }

    /// Mark every loaded unread notification read, all requests in flight at
    /// once. Whatever succeeded stays read even if other items failed.
    pub async fn mark_all_read(&mut self) -> MarkAllOutcome {
        let ids: Vec<i32> = self
            .items
            .iter()
            .filter(|n| !n.is_read)
            .map(|n| n.id)
            .collect();

        let outcome = self.service.mark_many_read(self.user_id, &ids).await;
        for receipt in &outcome.marked {
            self.mirror_read(receipt.id, receipt.read_at);
        }
        if !outcome.is_complete() {
            tracing::warn!(
                user_id = self.user_id,
                failed = outcome.failed.len(),
                "some notifications could not be marked read"
            );
        }
        outcome
    }

    /// Apply a row pushed by the hub. Rows for other users are ignored.
    pub fn apply_pushed(&mut self, notification: NotificationModel) {
        if notification.user_id != self.user_id
            || self.items.iter().any(|n| n.id == notification.id)
        {
            return;
        }
        if !notification.is_read {
            self.unread += 1;
        }
        self.items.insert(0, notification);
        self.items.truncate(self.config.limit as usize);
    }

    fn mirror_read(&mut self, id: i32, read_at: DateTime) {
        let Some(item) = self.items.iter_mut().find(|n| n.id == id) else {
            return;
        };
        if item.is_read {
            return;
        }
        item.is_read = true;
        item.read_at = Some(read_at);
        self.unread = self.unread.saturating_sub(1);
    }
}

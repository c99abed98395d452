use crate::{
    error::{AppError, AppResult},
    models::{NewNotification, NotificationModel},
    store::SharedStore,
    websocket::hub::NotificationHub,
};
use futures_util::stream::{self, StreamExt};
use sea_orm::prelude::DateTime;
use serde::Serialize;
use utoipa::ToSchema;

/// Bulk mark-read never holds more store calls than this in flight.
pub const MARK_READ_CONCURRENCY: usize = 8;

/// Result of a single unread→read transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReadReceipt {
    pub id: i32,
    #[schema(value_type = String)]
    pub read_at: DateTime,
    /// False when the notification was already read.
    pub changed: bool,
}

/// Per-item outcome of a bulk mark-read. Items are independent: a failure
/// never undoes the ones that succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct MarkAllOutcome {
    pub marked: Vec<ReadReceipt>,
    pub failed: Vec<i32>,
}

impl MarkAllOutcome {
    pub fn marked_count(&self) -> usize {
        self.marked.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct NotificationService {
    store: SharedStore,
    hub: NotificationHub,
}

impl NotificationService {
    pub fn new(store: SharedStore, hub: NotificationHub) -> Self {
        Self { store, hub }
    }

    /// Persist a notification and push it to the owner's live sessions.
    pub async fn notify(&self, new: NewNotification) -> AppResult<NotificationModel> {
        if new.title.trim().is_empty() {
            return Err(AppError::validation("notification title must not be empty"));
        }

        let saved = self.store.insert_notification(new).await?;
        let delivered = self.hub.publish(&saved);
        tracing::debug!(
            notification_id = saved.id,
            user_id = saved.user_id,
            kind = ?saved.kind,
            delivered,
            "notification created"
        );
        Ok(saved)
    }

    /// Companion notifications ride on a write that already succeeded, so a
    /// failure here is logged and reported as `None` instead of failing the caller.
    pub async fn notify_or_log(&self, new: NewNotification) -> Option<NotificationModel> {
        let user_id = new.user_id;
        let kind = new.kind();
        match self.notify(new).await {
            Ok(saved) => Some(saved),
            Err(e) => {
                tracing::warn!(user_id, ?kind, "failed to create notification: {e}");
                None
            }
        }
    }

    /// Newest first, at most `limit` rows. The limit is taken as given;
    /// request-facing caps belong to the caller.
    pub async fn list(&self, user_id: i32, limit: u64) -> AppResult<Vec<NotificationModel>> {
        self.store.list_notifications(user_id, limit).await
    }

    pub async fn count_unread(&self, user_id: i32) -> AppResult<u64> {
        self.store.count_unread_notifications(user_id).await
    }

    /// Mark one of `user_id`'s notifications read. Repeating the call is a
    /// no-op that still succeeds.
    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<ReadReceipt> {
        let existing = self
            .store
            .find_notification(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        let at = crate::store::now();
        let changed = self.store.mark_notification_read(id, at).await? > 0;
        let read_at = match (changed, existing.read_at) {
            (true, _) => at,
            (false, Some(stored)) => stored,
            // someone else marked it after we looked; report their timestamp
            (false, None) => self
                .store
                .find_notification(id)
                .await?
                .and_then(|n| n.read_at)
                .unwrap_or(at),
        };

        Ok(ReadReceipt {
            id,
            read_at,
            changed,
        })
    }

    /// Issue `mark_read` for every id concurrently, at most
    /// [`MARK_READ_CONCURRENCY`] in flight. There is no ordering between the
    /// items and no rollback.
    pub async fn mark_many_read(&self, user_id: i32, ids: &[i32]) -> MarkAllOutcome {
        let results: Vec<_> = stream::iter(ids.iter().copied())
            .map(|id| async move { (id, self.mark_read(id, user_id).await) })
            .buffer_unordered(MARK_READ_CONCURRENCY)
            .collect()
            .await;

        let mut outcome = MarkAllOutcome::default();
        for (id, result) in results {
            match result {
                Ok(receipt) => outcome.marked.push(receipt),
                Err(e) => {
                    tracing::warn!(notification_id = id, user_id, "failed to mark notification read: {e}");
                    outcome.failed.push(id);
                }
            }
        }
        outcome
    }

    pub async fn mark_all_read(&self, user_id: i32) -> AppResult<MarkAllOutcome> {
        let ids = self.store.unread_notification_ids(user_id).await?;
        Ok(self.mark_many_read(user_id, &ids).await)
    }
}

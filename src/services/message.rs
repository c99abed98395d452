use crate::{
    error::{AppError, AppResult},
    models::{
        ConversationKind, InboxEntry, MessageModel, NewMessage, NewNotification,
        NotificationModel, NotificationPayload, Priority,
    },
    services::notification::NotificationService,
    store::SharedStore,
};

pub const MAX_SUBJECT_LEN: usize = 200;

#[derive(Debug, Clone)]
pub struct SendMessage {
    pub sender_id: i32,
    pub recipient_id: i32,
    pub subject: String,
    pub body: String,
    pub conversation: ConversationKind,
}

impl SendMessage {
    fn validate(&self) -> AppResult<()> {
        if self.sender_id <= 0 {
            return Err(AppError::validation("sender is required"));
        }
        if self.recipient_id <= 0 {
            return Err(AppError::validation("recipient is required"));
        }
        if self.subject.trim().is_empty() {
            return Err(AppError::validation("subject must not be empty"));
        }
        if self.subject.chars().count() > MAX_SUBJECT_LEN {
            return Err(AppError::validation(format!(
                "subject must be at most {MAX_SUBJECT_LEN} characters"
            )));
        }
        if self.body.trim().is_empty() {
            return Err(AppError::validation("body must not be empty"));
        }
        Ok(())
    }
}

/// A persisted message and, when it could be created, the recipient's
/// companion notification.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: MessageModel,
    pub notification: Option<NotificationModel>,
}

pub struct MessageService {
    store: SharedStore,
    notifications: NotificationService,
}

impl MessageService {
    pub fn new(store: SharedStore, notifications: NotificationService) -> Self {
        Self {
            store,
            notifications,
        }
    }

    /// Everything is validated before the first write, so a rejected send
    /// leaves no message behind.
    pub async fn send(&self, request: SendMessage) -> AppResult<SentMessage> {
        request.validate()?;

        let sender = self
            .store
            .find_user(request.sender_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        if self.store.find_user(request.recipient_id).await?.is_none() {
            return Err(AppError::validation("recipient does not exist"));
        }

        let message = self
            .store
            .insert_message(NewMessage {
                sender_id: request.sender_id,
                recipient_id: request.recipient_id,
                subject: request.subject.trim().to_string(),
                body: request.body,
                conversation: request.conversation,
            })
            .await?;

        tracing::info!(
            message_id = message.id,
            sender_id = message.sender_id,
            recipient_id = message.recipient_id,
            "message sent"
        );

        let notification = self
            .notifications
            .notify_or_log(NewNotification {
                user_id: message.recipient_id,
                title: format!("Nuevo mensaje de {}", sender.full_name),
                body: message.subject.clone(),
                priority: Priority::Normal,
                payload: NotificationPayload::Message {
                    message_id: message.id,
                    sender_id: message.sender_id,
                },
            })
            .await;

        Ok(SentMessage {
            message,
            notification,
        })
    }

    pub async fn list_inbox(&self, user_id: i32, limit: u64) -> AppResult<Vec<InboxEntry>> {
        self.store.list_inbox(user_id, limit).await
    }

    /// Only the recipient may mark a message read; repeats are no-ops.
    pub async fn mark_read(&self, id: i32, user_id: i32) -> AppResult<bool> {
        let message = self
            .store
            .find_message(id)
            .await?
            .ok_or(AppError::NotFound)?;
        if message.recipient_id != user_id {
            return Err(AppError::Forbidden);
        }
        let changed = self
            .store
            .mark_message_read(id, crate::store::now())
            .await?;
        Ok(changed > 0)
    }
}

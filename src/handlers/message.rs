use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{ConversationKind, InboxEntry, MessageModel};
use crate::response::{ApiResponse, LimitQuery};
use crate::services::message::{MessageService, SendMessage};
use crate::services::notification::NotificationService;
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendMessageRequest {
    #[validate(range(min = 1))]
    pub recipient_id: i32,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1))]
    pub body: String,
    /// individual (default) or grupal
    #[serde(default = "default_conversation")]
    pub conversation: ConversationKind,
}

fn default_conversation() -> ConversationKind {
    ConversationKind::Individual
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub id: i32,
    pub sender_id: i32,
    pub recipient_id: i32,
    pub subject: String,
    pub body: String,
    pub conversation: ConversationKind,
    pub is_read: bool,
    pub sent_at: String,
    pub read_at: Option<String>,
}

impl From<MessageModel> for MessageResponse {
    fn from(m: MessageModel) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            recipient_id: m.recipient_id,
            subject: m.subject,
            body: m.body,
            conversation: m.conversation,
            is_read: m.is_read,
            sent_at: m.sent_at.to_string(),
            read_at: m.read_at.map(|t| t.to_string()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub message: MessageResponse,
    /// False when the message was stored but the recipient's notification was not.
    pub recipient_notified: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InboxEntryResponse {
    #[serde(flatten)]
    pub message: MessageResponse,
    pub sender_name: String,
}

impl From<InboxEntry> for InboxEntryResponse {
    fn from(entry: InboxEntry) -> Self {
        Self {
            message: entry.message.into(),
            sender_name: entry.sender_name,
        }
    }
}

fn message_service(store: SharedStore, hub: NotificationHub) -> MessageService {
    let notifications = NotificationService::new(store.clone(), hub);
    MessageService::new(store, notifications)
}

#[utoipa::path(
    post,
    path = "/api/v1/messages",
    security(("jwt_token" = [])),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message sent", body = SendMessageResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "messages"
)]
pub async fn send_message(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Json(payload): Json<SendMessageRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let sent = message_service(store, hub)
        .send(SendMessage {
            sender_id: auth_user.user_id,
            recipient_id: payload.recipient_id,
            subject: payload.subject,
            body: payload.body,
            conversation: payload.conversation,
        })
        .await?;

    let recipient_notified = sent.notification.is_some();
    let response = SendMessageResponse {
        message: sent.message.into(),
        recipient_notified,
    };
    if recipient_notified {
        Ok(ApiResponse::ok(response))
    } else {
        Ok(ApiResponse::with_message(
            response,
            "Message sent, but the recipient could not be notified",
        ))
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/messages/inbox",
    security(("jwt_token" = [])),
    params(
        ("limit" = Option<u64>, Query, description = "Newest N messages (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Received messages, newest first", body = Vec<InboxEntryResponse>),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "messages"
)]
pub async fn list_inbox(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Query(params): Query<LimitQuery>,
) -> AppResult<impl IntoResponse> {
    let entries: Vec<InboxEntryResponse> = message_service(store, hub)
        .list_inbox(auth_user.user_id, params.resolve())
        .await?
        .into_iter()
        .map(InboxEntryResponse::from)
        .collect();
    Ok(ApiResponse::ok(entries))
}

#[utoipa::path(
    put,
    path = "/api/v1/messages/{id}/read",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Message ID")),
    responses(
        (status = 200, description = "Message is read", body = serde_json::Value),
        (status = 403, description = "Not the recipient", body = AppError),
        (status = 404, description = "Message not found", body = AppError),
    ),
    tag = "messages"
)]
pub async fn mark_message_read(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let changed = message_service(store, hub)
        .mark_read(id, auth_user.user_id)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "id": id, "changed": changed })))
}

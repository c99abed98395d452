use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::models::{NotificationKind, NotificationModel, NotificationPayload, Priority};
use crate::response::{ApiResponse, LimitQuery};
use crate::services::notification::{MarkAllOutcome, NotificationService, ReadReceipt};
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i32,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub is_read: bool,
    pub created_at: String,
    pub read_at: Option<String>,
    pub payload: NotificationPayload,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            kind: n.kind,
            title: n.title,
            body: n.body,
            priority: n.priority,
            is_read: n.is_read,
            created_at: n.created_at.to_string(),
            read_at: n.read_at.map(|t| t.to_string()),
            payload: n.payload,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkAllReadResponse {
    pub marked_read: usize,
    /// Ids that stayed unread because their update failed.
    pub failed: Vec<i32>,
}

impl From<MarkAllOutcome> for MarkAllReadResponse {
    fn from(outcome: MarkAllOutcome) -> Self {
        Self {
            marked_read: outcome.marked_count(),
            failed: outcome.failed,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    security(("jwt_token" = [])),
    params(
        ("limit" = Option<u64>, Query, description = "Newest N notifications (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Notifications, newest first", body = Vec<NotificationResponse>),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Query(params): Query<LimitQuery>,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(store, hub);
    let items: Vec<NotificationResponse> = service
        .list(auth_user.user_id, params.resolve())
        .await?
        .into_iter()
        .map(NotificationResponse::from)
        .collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Unread notification count", body = UnreadCountResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn unread_count(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(store, hub);
    let count = service.count_unread(auth_user.user_id).await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Notification ID")),
    responses(
        (status = 200, description = "Notification is read", body = ReadReceipt),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
        (status = 403, description = "Not the owner", body = crate::error::AppError),
        (status = 404, description = "Notification not found", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(store, hub);
    let receipt = service.mark_read(id, auth_user.user_id).await?;
    Ok(ApiResponse::ok(receipt))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Per-item outcome of the bulk update", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorized", body = crate::error::AppError),
    ),
    tag = "notifications"
)]
pub async fn mark_all_read(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let service = NotificationService::new(store, hub);
    let outcome = service.mark_all_read(auth_user.user_id).await?;
    Ok(ApiResponse::ok(MarkAllReadResponse::from(outcome)))
}

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Role, SessionKind};
use crate::response::ApiResponse;
use crate::services::notification::NotificationService;
use crate::services::session::{ScheduleSession, SessionService};
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::prelude::DateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScheduleSessionRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Local date-time, e.g. 2026-03-02T10:00:00
    #[schema(value_type = String)]
    pub scheduled_at: DateTime,
    pub kind: SessionKind,
    /// Duplicates are dropped before the size check in the service.
    #[validate(length(min = 1, max = 200))]
    pub student_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: i32,
    pub tutor_id: i32,
    pub title: String,
    pub scheduled_at: String,
    pub kind: SessionKind,
    pub student_ids: Vec<i32>,
    /// Students whose notification was stored.
    pub notified: Vec<i32>,
}

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    security(("jwt_token" = [])),
    request_body = ScheduleSessionRequest,
    responses(
        (status = 200, description = "Session scheduled", body = SessionResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Tutors and administrators only", body = AppError),
    ),
    tag = "sessions"
)]
pub async fn schedule_session(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Json(payload): Json<ScheduleSessionRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_any(&[Role::Profesor, Role::Administrador])?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let notifications = NotificationService::new(store.clone(), hub);
    let scheduled = SessionService::new(store, notifications)
        .schedule(
            auth_user.user_id,
            ScheduleSession {
                title: payload.title,
                scheduled_at: payload.scheduled_at,
                kind: payload.kind,
                student_ids: payload.student_ids,
            },
        )
        .await?;

    let session = scheduled.session;
    Ok(ApiResponse::ok(SessionResponse {
        id: session.id,
        tutor_id: session.tutor_id,
        title: session.title,
        scheduled_at: session.scheduled_at.to_string(),
        kind: session.kind,
        student_ids: session.student_ids.0,
        notified: scheduled.notified.iter().map(|n| n.user_id).collect(),
    }))
}

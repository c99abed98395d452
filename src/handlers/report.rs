use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::response::ApiResponse;
use crate::services::academic_report::{AcademicReportService, SubmitReport};
use crate::services::notification::NotificationService;
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitReportRequest {
    /// Grading period, e.g. "1", "2", "3"
    #[validate(length(min = 1, max = 20))]
    pub parcial: String,
    /// Names of the failed subjects
    #[validate(length(min = 1))]
    pub subjects: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub student_id: i32,
    pub tutor_id: Option<i32>,
    pub parcial: String,
    pub subjects: Vec<String>,
    pub created_at: String,
    pub tutor_notified: bool,
    pub confirmation_sent: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = SubmitReportRequest,
    responses(
        (status = 200, description = "Report recorded", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Only students submit reports", body = AppError),
    ),
    tag = "reports"
)]
pub async fn submit_report(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Json(payload): Json<SubmitReportRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_any(&[Role::Alumno])?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let notifications = NotificationService::new(store.clone(), hub);
    let submitted = AcademicReportService::new(store, notifications)
        .submit(
            auth_user.user_id,
            SubmitReport {
                parcial: payload.parcial,
                subjects: payload.subjects,
            },
        )
        .await?;

    let report = submitted.report;
    Ok(ApiResponse::ok(ReportResponse {
        id: report.id,
        student_id: report.student_id,
        tutor_id: report.tutor_id,
        parcial: report.parcial,
        subjects: report.subjects.0,
        created_at: report.created_at.to_string(),
        tutor_notified: submitted.tutor_notification.is_some(),
        confirmation_sent: submitted.confirmation.is_some(),
    }))
}

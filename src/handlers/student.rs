use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{NotificationKind, RiskLevel, Role, StudentProfileModel};
use crate::response::ApiResponse;
use crate::services::alerts::AlertService;
use crate::services::notification::NotificationService;
use crate::services::student::{ProfileUpdate, StudentService};
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ProfileRequest {
    pub tutor_id: Option<i32>,
    #[validate(range(min = 1, max = 15))]
    pub semester: i32,
    #[serde(default)]
    pub social_service_completed: bool,
    #[serde(default)]
    pub internship_completed: bool,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub failed_subjects_count: i32,
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(req: ProfileRequest) -> Self {
        Self {
            tutor_id: req.tutor_id,
            semester: req.semester,
            social_service_completed: req.social_service_completed,
            internship_completed: req.internship_completed,
            failed_subjects_count: req.failed_subjects_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user_id: i32,
    pub tutor_id: Option<i32>,
    pub semester: i32,
    pub social_service_completed: bool,
    pub internship_completed: bool,
    pub failed_subjects_count: i32,
    pub risk_level: RiskLevel,
    pub updated_at: String,
}

impl From<StudentProfileModel> for ProfileResponse {
    fn from(p: StudentProfileModel) -> Self {
        Self {
            risk_level: p.risk_level(),
            user_id: p.user_id,
            tutor_id: p.tutor_id,
            semester: p.semester,
            social_service_completed: p.social_service_completed,
            internship_completed: p.internship_completed,
            failed_subjects_count: p.failed_subjects_count,
            updated_at: p.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertRunResponse {
    /// Kinds of the notifications that were stored, in rule order.
    pub emitted: Vec<NotificationKind>,
    pub triggered: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}/profile",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Student user ID")),
    responses(
        (status = 200, description = "Current profile", body = ProfileResponse),
        (status = 403, description = "Not your profile", body = AppError),
        (status = 404, description = "Student has no profile", body = AppError),
    ),
    tag = "students"
)]
pub async fn get_profile(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    // students may read their own snapshot
    if auth_user.user_id != id {
        auth_user.require_any(&[Role::Profesor, Role::Administrador])?;
    }
    let profile = StudentService::new(store).get_profile(id).await?;
    Ok(ApiResponse::ok(ProfileResponse::from(profile)))
}

#[utoipa::path(
    put,
    path = "/api/v1/students/{id}/profile",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Student user ID")),
    request_body = ProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ProfileResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Tutors and administrators only", body = AppError),
        (status = 404, description = "Student not found", body = AppError),
    ),
    tag = "students"
)]
pub async fn update_profile(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<ProfileRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_any(&[Role::Profesor, Role::Administrador])?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let profile = StudentService::new(store)
        .update_profile(id, payload.into())
        .await?;
    Ok(ApiResponse::ok(ProfileResponse::from(profile)))
}

#[utoipa::path(
    post,
    path = "/api/v1/students/{id}/alerts",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Student user ID")),
    responses(
        (status = 200, description = "Rules evaluated", body = AlertRunResponse),
        (status = 403, description = "Tutors and administrators only", body = AppError),
        (status = 404, description = "Student has no profile", body = AppError),
    ),
    tag = "students"
)]
pub async fn evaluate_alerts(
    Extension(store): Extension<SharedStore>,
    Extension(hub): Extension<NotificationHub>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_any(&[Role::Profesor, Role::Administrador])?;

    let notifications = NotificationService::new(store.clone(), hub);
    let run = AlertService::new(store, notifications)
        .evaluate_and_notify(id)
        .await?;

    Ok(ApiResponse::ok(AlertRunResponse {
        emitted: run.emitted.iter().map(|n| n.kind).collect(),
        triggered: run.triggered.len(),
    }))
}

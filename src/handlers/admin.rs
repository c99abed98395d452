use crate::config::auth::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::UserResponse;
use crate::handlers::student::{ProfileRequest, ProfileResponse};
use crate::middleware::AuthUser;
use crate::models::Role;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, NewAccount};
use crate::services::student::StudentService;
use crate::store::SharedStore;
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub full_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Role,
    /// Only accepted for students
    #[validate(nested)]
    pub profile: Option<ProfileRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedUserResponse {
    pub user: UserResponse,
    pub profile: Option<ProfileResponse>,
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Administrators only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn create_user(
    Extension(store): Extension<SharedStore>,
    Extension(config): Extension<AuthConfig>,
    auth_user: AuthUser,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    auth_user.require_any(&[Role::Administrador])?;
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;
    if payload.profile.is_some() && payload.role != Role::Alumno {
        return Err(AppError::validation("only students have an academic profile"));
    }
    // checked up front so a bad tutor does not leave a half-created account
    if let Some(tutor_id) = payload.profile.as_ref().and_then(|p| p.tutor_id) {
        match store.find_user(tutor_id).await? {
            Some(tutor) if tutor.role == Role::Profesor => {}
            _ => return Err(AppError::validation("tutor must be a professor")),
        }
    }

    let user = AuthService::new(store.clone(), config)
        .create_user(NewAccount {
            email: payload.email,
            full_name: payload.full_name,
            password: payload.password,
            role: payload.role,
        })
        .await?;

    let profile = match payload.profile {
        Some(profile) => Some(
            StudentService::new(store)
                .update_profile(user.id, profile.into())
                .await?,
        ),
        None => None,
    };

    Ok(ApiResponse::ok(CreatedUserResponse {
        user: user.into(),
        profile: profile.map(ProfileResponse::from),
    }))
}

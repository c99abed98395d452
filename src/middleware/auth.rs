use crate::{
    error::{AppError, AppResult},
    models::Role,
    store::SharedStore,
    utils::jwt::decode_jwt,
};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};

/// The caller of the current request. Handlers receive it explicitly and pass
/// the ids down; nothing reads the user from shared state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
}

impl AuthUser {
    pub fn require_any(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

/// JWT authentication middleware
///
/// Verifies the bearer token, re-reads the account so deleted users and role
/// changes take effect immediately, and stores the caller in the request
/// extensions.
pub async fn auth_middleware(
    Extension(store): Extension<SharedStore>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let auth_user = authenticate(&store, &token).await?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Shared by the HTTP middleware and the WebSocket handshake.
pub async fn authenticate(store: &SharedStore, token: &str) -> AppResult<AuthUser> {
    let claims = decode_jwt(token).map_err(|_| AppError::Unauthorized)?;
    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?;
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::store::MemoryStore;
    use axum::http::{header::AUTHORIZATION, HeaderValue};
    use std::sync::Arc;

    #[test]
    fn bearer_prefix_is_required() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_bearer_token(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn require_any_checks_the_role() {
        let tutor = AuthUser {
            user_id: 1,
            role: Role::Profesor,
        };
        assert!(tutor
            .require_any(&[Role::Profesor, Role::Administrador])
            .is_ok());
        assert!(matches!(
            tutor.require_any(&[Role::Alumno]),
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn role_comes_from_the_stored_account() {
        crate::utils::jwt::ensure_test_config();
        let store: SharedStore = Arc::new(MemoryStore::new());
        let user = store
            .insert_user(NewUser {
                email: "prof@uni.mx".into(),
                full_name: "Prof".into(),
                password_hash: String::new(),
                role: Role::Profesor,
            })
            .await
            .unwrap();

        // token claims an elevated role the account does not have
        let token = crate::utils::encode_access_token(user.id, Role::Administrador).unwrap();
        let auth = authenticate(&store, &token).await.unwrap();
        assert_eq!(auth.role, Role::Profesor);

        let orphan = crate::utils::encode_access_token(999, Role::Alumno).unwrap();
        assert!(matches!(
            authenticate(&store, &orphan).await,
            Err(AppError::Unauthorized)
        ));
    }
}

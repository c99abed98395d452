use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{NewUser, Role, UserModel},
    store::SharedStore,
    utils::{encode_access_token, hash_password, verify_password},
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
}

pub struct AuthService {
    store: SharedStore,
    config: AuthConfig,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

impl AuthService {
    pub fn new(store: SharedStore, config: AuthConfig) -> Self {
        Self { store, config }
    }

    /// Login by email.
    /// Returns (user_model, access_token)
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserModel, String)> {
        let user = self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = encode_access_token(user.id, user.role)?;
        tracing::info!(user_id = user.id, role = user.role.as_str(), "user logged in");
        Ok((user, token))
    }

    pub async fn get_user_by_id(&self, id: i32) -> AppResult<UserModel> {
        self.store.find_user(id).await?.ok_or(AppError::NotFound)
    }

    /// Create an account. Emails are stored lower-cased and must be unique.
    pub async fn create_user(&self, account: NewAccount) -> AppResult<UserModel> {
        let email = normalize_email(&account.email);
        let full_name = account.full_name.trim().to_string();

        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(AppError::validation("invalid email address"));
        }
        if full_name.is_empty() {
            return Err(AppError::validation("full name must not be empty"));
        }
        if account.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::validation("email already registered"));
        }

        let password_hash = hash_password(&account.password, self.config.bcrypt_cost)?;
        let user = self
            .store
            .insert_user(NewUser {
                email,
                full_name,
                password_hash,
                role: account.role,
            })
            .await?;

        tracing::info!(user_id = user.id, role = user.role.as_str(), "user created");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> AuthService {
        crate::utils::jwt::ensure_test_config();
        AuthService::new(Arc::new(MemoryStore::new()), AuthConfig { bcrypt_cost: 4 })
    }

    fn account(email: &str, password: &str) -> NewAccount {
        NewAccount {
            email: email.into(),
            full_name: "Carla Núñez".into(),
            password: password.into(),
            role: Role::Alumno,
        }
    }

    #[tokio::test]
    async fn login_returns_a_token_for_the_right_role() {
        let service = service();
        let created = service
            .create_user(account(" Carla@Uni.MX ", "contraseña1"))
            .await
            .unwrap();
        assert_eq!(created.email, "carla@uni.mx");

        let (user, token) = service.login("carla@uni.mx", "contraseña1").await.unwrap();
        assert_eq!(user.id, created.id);
        let claims = crate::utils::decode_jwt(&token).unwrap();
        assert_eq!(claims.sub, created.id);
        assert_eq!(claims.role, Role::Alumno);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let service = service();
        service
            .create_user(account("carla@uni.mx", "contraseña1"))
            .await
            .unwrap();
        assert!(matches!(
            service.login("carla@uni.mx", "otra-clave").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service.login("nadie@uni.mx", "contraseña1").await,
            Err(AppError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn account_input_is_validated() {
        let service = service();
        for bad in [
            account("sin-arroba", "contraseña1"),
            account("carla@uni.mx", "corta"),
            NewAccount {
                full_name: "   ".into(),
                ..account("carla@uni.mx", "contraseña1")
            },
        ] {
            assert!(matches!(
                service.create_user(bad).await,
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = service();
        service
            .create_user(account("carla@uni.mx", "contraseña1"))
            .await
            .unwrap();
        assert!(matches!(
            service
                .create_user(account("CARLA@uni.mx", "contraseña2"))
                .await,
            Err(AppError::Validation(_))
        ));
    }
}

use crate::config::auth::BootstrapAdminConfig;
use crate::error::AppResult;
use crate::models::Role;
use crate::services::auth::{AuthService, NewAccount};
use crate::store::SharedStore;

/// Create the configured administrator on startup:
/// - nothing happens when an administrator already exists
/// - an existing account with the configured email is left alone and logged
/// - otherwise a new administrator is created
pub async fn ensure_bootstrap_admin(
    store: &SharedStore,
    auth: &AuthService,
    config: Option<BootstrapAdminConfig>,
) -> AppResult<()> {
    let Some(cfg) = config else {
        return Ok(());
    };

    if store.any_user_with_role(Role::Administrador).await? {
        return Ok(());
    }

    if let Some(existing) = store
        .find_user_by_email(&cfg.email.trim().to_ascii_lowercase())
        .await?
    {
        tracing::warn!(
            user_id = existing.id,
            role = existing.role.as_str(),
            "bootstrap admin email already belongs to a non-admin account"
        );
        return Ok(());
    }

    let admin = auth
        .create_user(NewAccount {
            email: cfg.email,
            full_name: cfg.full_name,
            password: cfg.password,
            role: Role::Administrador,
        })
        .await?;
    tracing::info!(user_id = admin.id, "bootstrap administrator created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::auth::AuthConfig;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn cfg() -> BootstrapAdminConfig {
        BootstrapAdminConfig {
            email: "admin@uni.mx".into(),
            full_name: "Coordinación".into(),
            password: "administrador1".into(),
        }
    }

    #[tokio::test]
    async fn creates_the_admin_once() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), AuthConfig { bcrypt_cost: 4 });

        ensure_bootstrap_admin(&store, &auth, Some(cfg())).await.unwrap();
        ensure_bootstrap_admin(&store, &auth, Some(cfg())).await.unwrap();

        let admin = store.find_user_by_email("admin@uni.mx").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Administrador);
    }

    #[tokio::test]
    async fn disabled_config_does_nothing() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), AuthConfig { bcrypt_cost: 4 });
        ensure_bootstrap_admin(&store, &auth, None).await.unwrap();
        assert!(!store.any_user_with_role(Role::Administrador).await.unwrap());
    }
}

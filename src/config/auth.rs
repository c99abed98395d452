use super::{parse_bool_env, parse_env};
use std::env;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        // bcrypt rejects costs outside 4..=31
        let bcrypt_cost = parse_env("BCRYPT_COST", bcrypt::DEFAULT_COST).clamp(4, 31);
        Self { bcrypt_cost }
    }
}

/// Administrator created at startup when no administrator exists yet.
#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            full_name: env::var("BOOTSTRAP_ADMIN_NAME")
                .unwrap_or_else(|_| "Administrador".to_string()),
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

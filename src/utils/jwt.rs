use crate::config::jwt::JwtConfig;
use crate::models::Role;
use anyhow::{anyhow, Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Keys are derived once from the secret and shared by every request.
struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl_secs: u64,
}

static SESSION_KEYS: OnceLock<SessionKeys> = OnceLock::new();

/// Must be called once at startup, before the first login.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    let mut validation = Validation::default();
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.leeway = config.leeway_secs;

    let keys = SessionKeys {
        encoding: EncodingKey::from_secret(config.secret.as_bytes()),
        decoding: DecodingKey::from_secret(config.secret.as_bytes()),
        validation,
        issuer: config.issuer,
        ttl_secs: config.session_ttl_secs,
    };
    SESSION_KEYS
        .set(keys)
        .map_err(|_| anyhow!("session keys already initialized"))
}

fn keys() -> Result<&'static SessionKeys> {
    SESSION_KEYS
        .get()
        .context("session keys not initialized, call init_jwt_config() at startup")
}

/// Who the token was issued to. The role is informational only: requests
/// re-read it from the store.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub iss: String,
    pub exp: u64,
    pub iat: u64,
}

pub fn encode_access_token(user_id: i32, role: Role) -> Result<String> {
    let keys = keys()?;
    let now = jsonwebtoken::get_current_timestamp();
    let claims = Claims {
        sub: user_id,
        role,
        iss: keys.issuer.clone(),
        exp: now + keys.ttl_secs,
        iat: now,
    };
    encode(&Header::default(), &claims, &keys.encoding).context("failed to sign session token")
}

pub fn decode_jwt(token: &str) -> Result<Claims> {
    let keys = keys()?;
    let data = decode::<Claims>(token, &keys.decoding, &keys.validation)
        .context("invalid session token")?;
    Ok(data.claims)
}

#[cfg(test)]
pub(crate) fn ensure_test_config() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        std::env::set_var("JWT_SECRET", "a_very_long_secret_key_that_is_at_least_32_chars");
        let config = JwtConfig::from_env().unwrap();
        let _ = init_jwt_config(config);
    });
}

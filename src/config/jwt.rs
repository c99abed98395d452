use super::parse_env;
use anyhow::{bail, Context, Result};
use std::env;

pub const DEFAULT_ISSUER: &str = "tutorias";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    /// Seconds a session token stays valid. Defaults to one school day.
    pub session_ttl_secs: u64,
    pub leeway_secs: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET").context("JWT_SECRET environment variable must be set")?;
        if secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters");
        }

        let issuer = env::var("JWT_ISSUER")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ISSUER.to_string());

        let session_ttl_secs = parse_env("JWT_SESSION_TTL_SECS", 8 * 60 * 60);
        if session_ttl_secs == 0 {
            bail!("JWT_SESSION_TTL_SECS must be greater than zero");
        }

        Ok(Self {
            secret,
            issuer,
            session_ttl_secs,
            leeway_secs: parse_env("JWT_LEEWAY_SECS", 30),
        })
    }
}

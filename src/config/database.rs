use super::parse_env;
use anyhow::Context;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::env;
use std::time::Duration;

/// Which [`crate::store::Store`] backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn from_env() -> anyhow::Result<Self> {
        match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            other => Err(anyhow::anyhow!(
                "STORE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            )),
        }
    }
}

pub async fn get_database() -> anyhow::Result<DatabaseConnection> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let max_connections: u32 = parse_env("DB_MAX_CONNECTIONS", 10);
    let min_connections: u32 = parse_env("DB_MIN_CONNECTIONS", 2);

    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Ok(Database::connect(opt).await?)
}

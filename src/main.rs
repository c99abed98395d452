use sea_orm_migration::MigratorTrait;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tutorias::config::{
    auth::{AuthConfig, BootstrapAdminConfig},
    database::StoreBackend,
    feed::FeedConfig,
    jwt::JwtConfig,
};
use tutorias::services::{auth::AuthService, bootstrap_admin::ensure_bootstrap_admin};
use tutorias::store::{MemoryStore, PgStore, SharedStore};
use tutorias::websocket::hub::NotificationHub;
use tutorias::{app, config, migration, utils};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // LOG_FORMAT=json switches to one JSON object per line
    let json_logs = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let (plain_layer, json_layer) = if json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutorias=debug,tower_http=debug,axum=debug".into()),
        )
        .with(plain_layer)
        .with(json_layer)
        .init();

    // Validate configuration before doing anything else
    let (jwt_config, backend) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Tutorías API v{}...", env!("CARGO_PKG_VERSION"));

    let store: SharedStore = match backend {
        StoreBackend::Postgres => {
            let db = config::database::get_database().await?;
            tracing::info!("Database connected successfully");
            migration::Migrator::up(&db, None).await?;
            tracing::info!("Database migrations applied successfully");
            Arc::new(PgStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    let auth_config = AuthConfig::from_env();
    let feed_config = FeedConfig::from_env();
    tracing::info!(
        poll_seconds = feed_config.poll_interval.as_secs(),
        limit = feed_config.limit,
        "notification feed configured"
    );

    let auth_service = AuthService::new(store.clone(), auth_config);
    if let Err(e) =
        ensure_bootstrap_admin(&store, &auth_service, BootstrapAdminConfig::from_env()).await
    {
        tracing::error!("Failed to create bootstrap administrator: {e}");
    }

    let app = app::create_app(store, NotificationHub::new(), feed_config, auth_config);

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(JwtConfig, StoreBackend)> {
    let jwt_config = JwtConfig::from_env()?;
    let backend = StoreBackend::from_env()?;

    // DATABASE_URL is checked here for an early error; the connection happens later
    if backend == StoreBackend::Postgres && env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    Ok((jwt_config, backend))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for CTRL+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}

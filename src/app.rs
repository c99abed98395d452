use crate::config::{auth::AuthConfig, feed::FeedConfig};
use crate::routes;
use crate::store::SharedStore;
use crate::websocket::hub::NotificationHub;
use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::env;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth
        crate::handlers::login,
        crate::handlers::get_current_user,
        // Notifications
        crate::handlers::notification::list_notifications,
        crate::handlers::notification::unread_count,
        crate::handlers::notification::mark_all_read,
        crate::handlers::notification::mark_read,
        // Messages
        crate::handlers::message::send_message,
        crate::handlers::message::list_inbox,
        crate::handlers::message::mark_message_read,
        // Academic reports
        crate::handlers::report::submit_report,
        // Sessions
        crate::handlers::session::schedule_session,
        // Students
        crate::handlers::student::get_profile,
        crate::handlers::student::update_profile,
        crate::handlers::student::evaluate_alerts,
        // Admin
        crate::handlers::admin::create_user,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::response::LimitQuery,
            crate::error::AppError,
            crate::models::Role,
            crate::models::NotificationKind,
            crate::models::Priority,
            crate::models::NotificationPayload,
            crate::models::ConversationKind,
            crate::models::SessionKind,
            crate::models::RiskLevel,
            crate::services::notification::ReadReceipt,
            // Auth
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::AuthResponse,
            crate::handlers::auth::UserResponse,
            // Notifications
            crate::handlers::notification::NotificationResponse,
            crate::handlers::notification::UnreadCountResponse,
            crate::handlers::notification::MarkAllReadResponse,
            // Messages
            crate::handlers::message::SendMessageRequest,
            crate::handlers::message::SendMessageResponse,
            crate::handlers::message::MessageResponse,
            crate::handlers::message::InboxEntryResponse,
            // Reports
            crate::handlers::report::SubmitReportRequest,
            crate::handlers::report::ReportResponse,
            // Sessions
            crate::handlers::session::ScheduleSessionRequest,
            crate::handlers::session::SessionResponse,
            // Students
            crate::handlers::student::ProfileRequest,
            crate::handlers::student::ProfileResponse,
            crate::handlers::student::AlertRunResponse,
            // Admin
            crate::handlers::admin::CreateUserRequest,
            crate::handlers::admin::CreatedUserResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login and session"),
        (name = "notifications", description = "Notification center"),
        (name = "messages", description = "Message center"),
        (name = "reports", description = "Academic reports from students"),
        (name = "sessions", description = "Tutoring sessions"),
        (name = "students", description = "Student profiles and alert rules"),
        (name = "admin", description = "Administrative operations"),
    )
)]
pub struct ApiDoc;

/// Router with every shared dependency attached. `main` and the integration
/// tests build the service the same way.
pub fn create_app(
    store: SharedStore,
    hub: NotificationHub,
    feed_config: FeedConfig,
    auth_config: AuthConfig,
) -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(Extension(store))
        .layer(Extension(hub))
        .layer(Extension(feed_config))
        .layer(Extension(auth_config))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(store): Extension<SharedStore>) -> impl IntoResponse {
    let store_ok = store.ping().await;
    let status = if store_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Tutorías API",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_ok,
    }))
}

use crate::handlers;
use crate::middleware::auth::auth_middleware;
use crate::websocket;
use axum::{middleware, routing, Router};

pub fn create_routes() -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        // WebSocket route (auth handled inside the handler via query token)
        .route("/ws", routing::get(websocket::notification::ws_handler))
}

fn api_routes() -> Router {
    let protected = protected_routes().layer(middleware::from_fn(auth_middleware));
    public_routes().merge(protected)
}

fn public_routes() -> Router {
    Router::new().route("/auth/login", routing::post(handlers::login))
}

/// Every route below sees an `AuthUser`; role checks happen in the handlers.
fn protected_routes() -> Router {
    Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        // Notifications
        .route(
            "/notifications",
            routing::get(handlers::notification::list_notifications),
        )
        .route(
            "/notifications/unread-count",
            routing::get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            routing::put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            routing::put(handlers::notification::mark_read),
        )
        // Messages
        .route("/messages", routing::post(handlers::message::send_message))
        .route(
            "/messages/inbox",
            routing::get(handlers::message::list_inbox),
        )
        .route(
            "/messages/{id}/read",
            routing::put(handlers::message::mark_message_read),
        )
        // Academic reports (students)
        .route("/reports", routing::post(handlers::report::submit_report))
        // Tutoring sessions (tutors, admins)
        .route(
            "/sessions",
            routing::post(handlers::session::schedule_session),
        )
        // Student profiles and alert rules (tutors, admins)
        .route(
            "/students/{id}/profile",
            routing::get(handlers::student::get_profile)
                .put(handlers::student::update_profile),
        )
        .route(
            "/students/{id}/alerts",
            routing::post(handlers::student::evaluate_alerts),
        )
        // Admin
        .route("/admin/users", routing::post(handlers::admin::create_user))
}

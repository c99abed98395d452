#![allow(dead_code)]

use reqwest::Client;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};
use tutorias::config::{auth::AuthConfig, feed::FeedConfig};
use tutorias::models::{Role, StudentProfileModel};
use tutorias::services::auth::{AuthService, NewAccount};
use tutorias::store::{MemoryStore, Store};
use tutorias::websocket::hub::NotificationHub;

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const TEST_PASSWORD: &str = "clave_de_prueba_123";

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        let config = tutorias::config::jwt::JwtConfig::from_env().unwrap();
        let _ = tutorias::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub store: Arc<MemoryStore>,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

/// Serve the full router over TCP on a random port, backed by a fresh
/// in-memory store so tests never share rows.
pub async fn spawn_app() -> TestApp {
    init_env();

    let store = Arc::new(MemoryStore::new());
    let app = tutorias::app::create_app(
        store.clone(),
        NotificationHub::new(),
        FeedConfig::default(),
        AuthConfig { bcrypt_cost: 4 },
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        store,
        client: Client::new(),
    }
}

/// Create an account straight in the store and log in over HTTP.
/// Returns (user_id, token).
pub async fn create_test_user(app: &TestApp, prefix: &str, role: Role) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let email = format!("{}_{}@uni.test", prefix, counter);

    let auth = AuthService::new(app.store.clone(), AuthConfig { bcrypt_cost: 4 });
    let user = auth
        .create_user(NewAccount {
            email: email.clone(),
            full_name: format!("{} {}", prefix, counter),
            password: TEST_PASSWORD.to_string(),
            role,
        })
        .await
        .expect("Failed to create user");

    let token = login(app, &email, TEST_PASSWORD).await;
    (user.id, token)
}

pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse login response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Login failed for '{}': status={}, body={}", email, status, body);
    }
    body["data"]["token"]
        .as_str()
        .expect("Login response missing token")
        .to_string()
}

/// Store a profile snapshot directly, bypassing the HTTP validation.
pub async fn set_profile(
    app: &TestApp,
    student_id: i32,
    tutor_id: Option<i32>,
    semester: i32,
    failed_subjects_count: i32,
) {
    app.store
        .save_student_profile(StudentProfileModel {
            user_id: student_id,
            tutor_id,
            semester,
            social_service_completed: false,
            internship_completed: false,
            failed_subjects_count,
            updated_at: chrono::Utc::now().naive_utc(),
        })
        .await
        .expect("Failed to save profile");
}

pub async fn get_json(app: &TestApp, path: &str, token: &str) -> serde_json::Value {
    let resp = app
        .client
        .get(app.url(path))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200, "GET {} failed", path);
    resp.json().await.unwrap()
}

pub async fn unread_count(app: &TestApp, token: &str) -> u64 {
    get_json(app, "/notifications/unread-count", token).await["data"]["count"]
        .as_u64()
        .expect("unread count missing")
}

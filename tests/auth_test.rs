mod common;

use serde_json::Value;
use tutorias::models::Role;

#[tokio::test]
async fn login_and_get_current_user() {
    let app = common::spawn_app().await;
    let (user_id, token) = common::create_test_user(&app, "alumna", Role::Alumno).await;

    let body = common::get_json(&app, "/auth/me", &token).await;
    assert!(body["success"].as_bool().unwrap());
    assert_eq!(body["data"]["id"].as_i64().unwrap() as i32, user_id);
    assert_eq!(body["data"]["role"], "alumno");
    assert!(body["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = common::spawn_app().await;
    common::create_test_user(&app, "alumno", Role::Alumno).await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({
            "email": "alumno_0@uni.test",
            "password": "not_the_password"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn login_rejects_malformed_email() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": "no-es-correo", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn protected_routes_need_a_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .get(app.url("/notifications"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/auth/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

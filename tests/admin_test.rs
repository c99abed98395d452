mod common;

use serde_json::Value;
use tutorias::models::Role;

#[tokio::test]
async fn admin_creates_a_student_with_profile() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_test_user(&app, "admin", Role::Administrador).await;
    let (tutor_id, _) = common::create_test_user(&app, "tutor", Role::Profesor).await;

    let resp = app
        .client
        .post(app.url("/admin/users"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "email": "nueva@uni.test",
            "full_name": "Nueva Alumna",
            "password": "clave_segura_1",
            "role": "alumno",
            "profile": { "tutor_id": tutor_id, "semester": 1 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["user"]["role"], "alumno");
    assert_eq!(body["data"]["profile"]["risk_level"], "bajo");
    assert_eq!(body["data"]["profile"]["tutor_id"].as_i64().unwrap() as i32, tutor_id);

    // the new account can log in
    common::login(&app, "nueva@uni.test", "clave_segura_1").await;
}

#[tokio::test]
async fn profile_is_only_for_students() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_test_user(&app, "admin", Role::Administrador).await;

    let resp = app
        .client
        .post(app.url("/admin/users"))
        .bearer_auth(&admin_token)
        .json(&serde_json::json!({
            "email": "prof@uni.test",
            "full_name": "Profesor",
            "password": "clave_segura_1",
            "role": "profesor",
            "profile": { "semester": 1 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_test_user(&app, "admin", Role::Administrador).await;

    let payload = serde_json::json!({
        "email": "repetido@uni.test",
        "full_name": "Persona",
        "password": "clave_segura_1",
        "role": "profesor"
    });
    for expected in [200, 400] {
        let resp = app
            .client
            .post(app.url("/admin/users"))
            .bearer_auth(&admin_token)
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }
}

#[tokio::test]
async fn non_admins_cannot_create_users() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;

    let resp = app
        .client
        .post(app.url("/admin/users"))
        .bearer_auth(&tutor_token)
        .json(&serde_json::json!({
            "email": "x@uni.test",
            "full_name": "X",
            "password": "clave_segura_1",
            "role": "administrador"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

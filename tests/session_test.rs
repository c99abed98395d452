mod common;

use serde_json::Value;
use tutorias::models::Role;

#[tokio::test]
async fn scheduling_notifies_every_invited_student() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (ana, ana_token) = common::create_test_user(&app, "ana", Role::Alumno).await;
    let (beto, _) = common::create_test_user(&app, "beto", Role::Alumno).await;

    let resp = app
        .client
        .post(app.url("/sessions"))
        .bearer_auth(&tutor_token)
        .json(&serde_json::json!({
            "title": "Revisión de avance",
            "scheduled_at": "2026-11-02T10:00:00",
            "kind": "grupal",
            "student_ids": [ana, beto]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["notified"], serde_json::json!([ana, beto]));

    let feed = common::get_json(&app, "/notifications", &ana_token).await;
    assert_eq!(feed["data"][0]["kind"], "sesion_programada");
    assert_eq!(feed["data"][0]["payload"]["type"], "session_scheduled");
}

#[tokio::test]
async fn students_cannot_schedule_sessions() {
    let app = common::spawn_app().await;
    let (ana, ana_token) = common::create_test_user(&app, "ana", Role::Alumno).await;

    let resp = app
        .client
        .post(app.url("/sessions"))
        .bearer_auth(&ana_token)
        .json(&serde_json::json!({
            "title": "Estudio",
            "scheduled_at": "2026-11-02T10:00:00",
            "kind": "individual",
            "student_ids": [ana]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn individual_session_with_two_students_is_rejected() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (ana, _) = common::create_test_user(&app, "ana", Role::Alumno).await;
    let (beto, _) = common::create_test_user(&app, "beto", Role::Alumno).await;

    let resp = app
        .client
        .post(app.url("/sessions"))
        .bearer_auth(&tutor_token)
        .json(&serde_json::json!({
            "title": "Revisión",
            "scheduled_at": "2026-11-02T10:00:00",
            "kind": "individual",
            "student_ids": [ana, beto]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    assert_eq!(app.store.notification_count(), 0);
}

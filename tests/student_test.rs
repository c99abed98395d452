mod common;

use serde_json::Value;
use tutorias::models::{NotificationKind, Role};

async fn evaluate(app: &common::TestApp, token: &str, student_id: i32) -> reqwest::Response {
    app.client
        .post(app.url(&format!("/students/{}/alerts", student_id)))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn tutor_updates_profile_and_sees_risk_level() {
    let app = common::spawn_app().await;
    let (tutor_id, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (student_id, _) = common::create_test_user(&app, "alumno", Role::Alumno).await;

    let resp = app
        .client
        .put(app.url(&format!("/students/{}/profile", student_id)))
        .bearer_auth(&tutor_token)
        .json(&serde_json::json!({
            "tutor_id": tutor_id,
            "semester": 6,
            "failed_subjects_count": 2
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["risk_level"], "medio");
    assert_eq!(body["data"]["social_service_completed"], false);
}

#[tokio::test]
async fn students_cannot_edit_profiles() {
    let app = common::spawn_app().await;
    let (student_id, student_token) = common::create_test_user(&app, "alumno", Role::Alumno).await;

    let resp = app
        .client
        .put(app.url(&format!("/students/{}/profile", student_id)))
        .bearer_auth(&student_token)
        .json(&serde_json::json!({ "semester": 9, "failed_subjects_count": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn students_read_only_their_own_profile() {
    let app = common::spawn_app().await;
    let (student_id, student_token) = common::create_test_user(&app, "alumno", Role::Alumno).await;
    let (other_id, _) = common::create_test_user(&app, "alumno", Role::Alumno).await;
    common::set_profile(&app, student_id, None, 8, 0).await;
    common::set_profile(&app, other_id, None, 3, 0).await;

    let own = common::get_json(&app, &format!("/students/{}/profile", student_id), &student_token).await;
    assert_eq!(own["data"]["semester"], 8);
    assert_eq!(own["data"]["risk_level"], "bajo");

    let resp = app
        .client
        .get(app.url(&format!("/students/{}/profile", other_id)))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
async fn three_failed_subjects_raise_a_critical_alert_each_time() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (student_id, student_token) = common::create_test_user(&app, "alumno", Role::Alumno).await;
    common::set_profile(&app, student_id, None, 4, 3).await;

    let resp = evaluate(&app, &tutor_token, student_id).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["emitted"], serde_json::json!(["alerta_riesgo_academico"]));

    // No deduplication: a second run on the same snapshot alerts again.
    evaluate(&app, &tutor_token, student_id).await;

    let feed = common::get_json(&app, "/notifications", &student_token).await;
    let items = feed["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items
        .iter()
        .all(|n| n["kind"] == "alerta_riesgo_academico" && n["priority"] == "critica"));

    let stored = app
        .store
        .all_notifications()
        .into_iter()
        .filter(|n| n.kind == NotificationKind::AcademicRiskAlert)
        .count();
    assert_eq!(stored, 2);
}

#[tokio::test]
async fn late_semester_raises_service_and_internship_alerts() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (student_id, _) = common::create_test_user(&app, "alumno", Role::Alumno).await;
    common::set_profile(&app, student_id, None, 9, 0).await;

    let body: Value = evaluate(&app, &tutor_token, student_id)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(
        body["data"]["emitted"],
        serde_json::json!(["alerta_servicio_social", "alerta_practicas"])
    );
}

#[tokio::test]
async fn alerts_for_a_student_without_profile_are_not_found() {
    let app = common::spawn_app().await;
    let (_, tutor_token) = common::create_test_user(&app, "tutor", Role::Profesor).await;
    let (student_id, _) = common::create_test_user(&app, "alumno", Role::Alumno).await;

    let resp = evaluate(&app, &tutor_token, student_id).await;
    assert_eq!(resp.status(), 404);
}

//! End-to-end session lifecycle through the HTTP surface: creation gates,
//! per-student responses, transitions, and the entitlement-exhausted path.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use sqlx::PgPool;

use common::*;

#[sqlx::test(migrations = "../db/migrations")]
async fn full_lifecycle_create_respond_start_complete(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);
    set_level_terms(&pool, tutor.tutor_id, level, 10).await;
    accepted_hire(&pool, student.student_id, tutor.tutor_id, subject, level).await;
    let entitlement =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 1).await;

    let app = build_test_app(pool.clone());
    let tutor_auth = bearer(tutor.user_id, "tutor");
    let student_auth = bearer(student.user_id, "student");

    // Create.
    let starts_at = Utc::now() + Duration::days(2);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": starts_at,
            "duration_hours": 1.5,
            "hourly_rate": 30.0,
            "notes": "Fractions revision",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    let session_id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["total_earnings"], 45.0);
    assert!(body["data"]["meeting_link"]
        .as_str()
        .unwrap()
        .contains("meet.jit.si"));

    // Student confirms.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/respond"),
        Some(&student_auth),
        Some(serde_json::json!({ "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "confirmed");

    // Start.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/start"),
        Some(&tutor_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "in_progress");

    // Complete: decrements the linked entitlement.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/complete"),
        Some(&tutor_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let remaining: i32 =
        sqlx::query_scalar("SELECT sessions_remaining FROM entitlements WHERE id = $1")
            .bind(entitlement.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(remaining, 0);

    // A second completion is a terminal-state conflict.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/complete"),
        Some(&tutor_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "TERMINAL_STATE");

    // The entitlement is exhausted: the next creation attempt returns the
    // per-student breakdown.
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": starts_at + Duration::days(1),
            "duration_hours": 1.0,
            "hourly_rate": 30.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "ENTITLEMENT_REQUIRED");
    let students = body["students"].as_array().unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0]["authorized"], false);
    assert_eq!(students[0]["reason"], "no_sessions_remaining");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn creation_rejected_without_accepted_hire(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);
    set_level_terms(&pool, tutor.tutor_id, level, 10).await;

    let app = build_test_app(pool);
    let tutor_auth = bearer(tutor.user_id, "tutor");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": Utc::now() + Duration::days(2),
            "duration_hours": 1.0,
            "hourly_rate": 25.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn cap_reached_rejects_creation(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);
    set_level_terms(&pool, tutor.tutor_id, level, 4).await;
    accepted_hire(&pool, student.student_id, tutor.tutor_id, subject, level).await;
    paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 10).await;

    // Four completed sessions already on the books.
    for day in 0..4 {
        insert_completed_session(
            &pool,
            tutor.tutor_id,
            subject,
            level,
            Utc::now() - Duration::days(30 + day),
        )
        .await;
    }

    let app = build_test_app(pool);
    let tutor_auth = bearer(tutor.user_id, "tutor");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": Utc::now() + Duration::days(2),
            "duration_hours": 1.0,
            "hourly_rate": 25.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("maximum number"));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn confirmed_session_schedule_is_frozen(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);
    set_level_terms(&pool, tutor.tutor_id, level, 10).await;
    accepted_hire(&pool, student.student_id, tutor.tutor_id, subject, level).await;
    paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 5).await;

    let app = build_test_app(pool);
    let tutor_auth = bearer(tutor.user_id, "tutor");
    let student_auth = bearer(student.user_id, "student");

    let starts_at = Utc::now() + Duration::days(3);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": starts_at,
            "duration_hours": 1.0,
            "hourly_rate": 25.0,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/respond"),
        Some(&student_auth),
        Some(serde_json::json!({ "status": "confirmed" })),
    )
    .await;

    // Proposals are rejected outright once confirmed.
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/propose"),
        Some(&student_auth),
        Some(serde_json::json!({ "proposed_start": starts_at + Duration::days(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Cannot change date/time of a confirmed session"));

    // So are direct reschedules.
    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/sessions/{session_id}/schedule"),
        Some(&tutor_auth),
        Some(serde_json::json!({ "starts_at": starts_at + Duration::days(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn declined_student_cannot_rate(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);
    set_level_terms(&pool, tutor.tutor_id, level, 10).await;
    accepted_hire(&pool, student.student_id, tutor.tutor_id, subject, level).await;
    paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 5).await;

    let app = build_test_app(pool);
    let tutor_auth = bearer(tutor.user_id, "tutor");
    let student_auth = bearer(student.user_id, "student");

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/sessions",
        Some(&tutor_auth),
        Some(serde_json::json!({
            "student_ids": [student.student_id],
            "subject_id": subject,
            "level_id": level,
            "starts_at": Utc::now() + Duration::days(2),
            "duration_hours": 1.0,
            "hourly_rate": 25.0,
        })),
    )
    .await;
    let session_id = body["data"]["id"].as_i64().unwrap();

    send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/respond"),
        Some(&student_auth),
        Some(serde_json::json!({ "status": "declined" })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{session_id}/rate"),
        Some(&student_auth),
        Some(serde_json::json!({ "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("declined"));
}

//! Shared harness for API integration tests.
//!
//! Builds the production router (same middleware stack as `main.rs`) on top
//! of a `#[sqlx::test]`-provided pool, with helpers for seeding fixtures and
//! driving requests through `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use tutorlane_api::auth::jwt::{generate_access_token, JwtConfig};
use tutorlane_api::config::ServerConfig;
use tutorlane_api::router::build_app_router;
use tutorlane_api::state::AppState;
use tutorlane_core::hire;
use tutorlane_core::types::DbId;
use tutorlane_db::models::entitlement::{Entitlement, IssueEntitlement};
use tutorlane_db::models::tutor::UpsertLevelTerms;
use tutorlane_db::models::user::CreateUser;
use tutorlane_db::repositories::{
    EntitlementRepo, HireRepo, StudentRepo, TutorRepo, UserRepo,
};
use tutorlane_events::EventBus;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::new(EventBus::default()),
    };
    build_app_router(state, &config)
}

/// A `Bearer ...` header value for the given user.
pub fn bearer(user_id: DbId, role: &str) -> String {
    let token = generate_access_token(user_id, role, &test_config().jwt)
        .expect("token generation cannot fail with a fixed secret");
    format!("Bearer {token}")
}

/// Drive one request through the router and decode the JSON response.
pub async fn send(
    app: &Router,
    method: Method,
    path: &str,
    auth: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub struct TutorFixture {
    pub user_id: DbId,
    pub tutor_id: DbId,
}

pub struct StudentFixture {
    pub user_id: DbId,
    pub student_id: DbId,
}

pub async fn subject_id(pool: &PgPool) -> DbId {
    sqlx::query_scalar("SELECT id FROM subjects ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn level_id(pool: &PgPool) -> DbId {
    sqlx::query_scalar("SELECT id FROM education_levels ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn create_tutor(pool: &PgPool, name: &str) -> TutorFixture {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            full_name: name.to_string(),
            email: format!("{}@tutors.test", name.to_lowercase().replace(' ', ".")),
            password_hash: "x".to_string(),
            role: "tutor".to_string(),
            account_status: Some("active".to_string()),
        },
    )
    .await
    .unwrap();
    let tutor = TutorRepo::create(pool, user.id, "").await.unwrap();
    TutorFixture {
        user_id: user.id,
        tutor_id: tutor.id,
    }
}

pub async fn create_student(pool: &PgPool, name: &str) -> StudentFixture {
    let user = UserRepo::create(
        pool,
        &CreateUser {
            full_name: name.to_string(),
            email: format!("{}@students.test", name.to_lowercase().replace(' ', ".")),
            password_hash: "x".to_string(),
            role: "student".to_string(),
            account_status: Some("active".to_string()),
        },
    )
    .await
    .unwrap();
    let student = StudentRepo::create(pool, user.id, None, None).await.unwrap();
    StudentFixture {
        user_id: user.id,
        student_id: student.id,
    }
}

pub async fn set_level_terms(pool: &PgPool, tutor_id: DbId, level: DbId, cap: i32) {
    TutorRepo::upsert_level_terms(
        pool,
        tutor_id,
        &UpsertLevelTerms {
            level_id: level,
            hourly_rate: 25.0,
            discount_percent: Some(0.0),
            sessions_per_month: cap,
            monthly_rate: None,
        },
    )
    .await
    .unwrap();
}

pub async fn accepted_hire(
    pool: &PgPool,
    student_id: DbId,
    tutor_id: DbId,
    subject: DbId,
    level: DbId,
) {
    let record = HireRepo::create(pool, student_id, tutor_id, subject, level)
        .await
        .unwrap();
    HireRepo::set_status(pool, record.id, hire::STATUS_ACCEPTED)
        .await
        .unwrap();
}

pub async fn paid_entitlement(
    pool: &PgPool,
    student_id: DbId,
    tutor_id: DbId,
    subject: DbId,
    level: DbId,
    granted: i32,
) -> Entitlement {
    let issued = EntitlementRepo::issue(
        pool,
        &IssueEntitlement {
            student_id,
            tutor_id,
            subject_id: subject,
            level_id: level,
            payment_type: "monthly".to_string(),
            base_rate: 25.0,
            discount_percent: 0.0,
            monthly_amount: None,
            sessions_per_period: granted,
            request_notes: String::new(),
            currency: "GBP".to_string(),
            renews_entitlement_id: None,
        },
    )
    .await
    .unwrap();
    EntitlementRepo::activate(pool, issued.id, chrono::Utc::now())
        .await
        .unwrap()
        .expect("fresh entitlement must activate")
}

/// Insert a completed session directly (for cap scenarios).
pub async fn insert_completed_session(
    pool: &PgPool,
    tutor_id: DbId,
    subject: DbId,
    level: DbId,
    starts_at: chrono::DateTime<chrono::Utc>,
) {
    sqlx::query(
        "INSERT INTO sessions \
            (tutor_id, subject_id, level_id, starts_at, duration_hours, hourly_rate, \
             total_earnings, status, completed_at) \
         VALUES ($1, $2, $3, $4, 1.0, 25.0, 25.0, 'completed', now())",
    )
    .bind(tutor_id)
    .bind(subject)
    .bind(level)
    .bind(starts_at)
    .execute(pool)
    .await
    .unwrap();
}

//! Shared fixtures for repository integration tests.
//!
//! Each `#[sqlx::test]` gets its own freshly-migrated database, so fixtures
//! can use fixed names without colliding across tests.

#![allow(dead_code)]

use sqlx::PgPool;
use tutorlane_core::hire;
use tutorlane_core::types::{DbId, Timestamp};
use tutorlane_db::models::entitlement::{Entitlement, IssueEntitlement};
use tutorlane_db::models::tutor::UpsertLevelTerms;
use tutorlane_db::models::user::CreateUser;
use tutorlane_db::repositories::{
    EntitlementRepo, HireRepo, StudentRepo, TutorRepo, UserRepo,
};

pub struct TutorFixture {
    pub user_id: DbId,
    pub tutor_id: DbId,
}

pub struct StudentFixture {
    pub user_id: DbId,
    pub student_id: DbId,
}

/// First seeded subject.
pub async fn subject_id(pool: &PgPool) -> DbId {
    sqlx::query_scalar("SELECT id FROM subjects ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// First seeded education level.
pub async fn level_id(pool: &PgPool) -> DbId {
    sqlx::query_scalar("SELECT id FROM education_levels ORDER BY id LIMIT 1")
        .fetch_one(pool)
        .await
        .unwrap()
}

/// An active tutor account with a profile.
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

/// An active student account with a profile.
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

/// Publish level terms for a tutor (rate 25/hr, `cap` sessions per month).
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

/// An accepted hire between a student and a tutor.
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

/// An issued entitlement (pending payment) granting `granted` sessions.
pub async fn issued_entitlement(
    pool: &PgPool,
    student_id: DbId,
    tutor_id: DbId,
    subject: DbId,
    level: DbId,
    granted: i32,
) -> Entitlement {
    EntitlementRepo::issue(
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
    .unwrap()
}

/// An activated (paid + active) entitlement granting `granted` sessions.
pub async fn paid_entitlement(
    pool: &PgPool,
    student_id: DbId,
    tutor_id: DbId,
    subject: DbId,
    level: DbId,
    granted: i32,
) -> Entitlement {
    let issued = issued_entitlement(pool, student_id, tutor_id, subject, level, granted).await;
    EntitlementRepo::activate(pool, issued.id, chrono::Utc::now())
        .await
        .unwrap()
        .expect("fresh entitlement must activate")
}

/// Force an entitlement's validity window into the past.
pub async fn backdate_validity(pool: &PgPool, entitlement_id: DbId, end: Timestamp) {
    sqlx::query("UPDATE entitlements SET validity_end = $2 WHERE id = $1")
        .bind(entitlement_id)
        .bind(end)
        .execute(pool)
        .await
        .unwrap();
}

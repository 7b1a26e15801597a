//! Integration tests for the entitlement ledger: activation, consumption,
//! lazy expiry reconciliation, and renewal.

mod common;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use tutorlane_core::entitlement::{
    PAYMENT_PAID, PAYMENT_PENDING, VALIDITY_ACTIVE, VALIDITY_EXPIRED, VALIDITY_PENDING,
};
use tutorlane_db::repositories::EntitlementRepo;

use common::*;

#[sqlx::test(migrations = "./migrations")]
async fn issue_starts_pending_with_no_window(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let issued =
        issued_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;

    assert_eq!(issued.payment_status, PAYMENT_PENDING);
    assert_eq!(issued.validity_status, VALIDITY_PENDING);
    assert!(issued.validity_start.is_none());
    assert!(issued.validity_end.is_none());
    assert_eq!(issued.sessions_remaining, 0);
    assert_eq!(issued.sessions_per_period, 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn activation_opens_thirty_day_window_and_full_grant(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let issued =
        issued_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;
    let now = Utc::now();
    let activated = EntitlementRepo::activate(&pool, issued.id, now)
        .await
        .unwrap()
        .expect("first activation succeeds");

    assert_eq!(activated.payment_status, PAYMENT_PAID);
    assert_eq!(activated.validity_status, VALIDITY_ACTIVE);
    assert_eq!(activated.sessions_remaining, 4);
    let end = activated.validity_end.unwrap();
    let start = activated.validity_start.unwrap();
    assert_eq!(end - start, Duration::days(30));
    assert!(activated.is_authorizing(now));
}

#[sqlx::test(migrations = "./migrations")]
async fn reactivation_is_rejected(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let paid =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;

    // A duplicate gateway callback must not reset the window or the grant.
    let second = EntitlementRepo::activate(&pool, paid.id, Utc::now())
        .await
        .unwrap();
    assert!(second.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn consume_floors_at_zero(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let paid =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 2).await;

    assert!(EntitlementRepo::consume(&pool, paid.id).await.unwrap());
    assert!(EntitlementRepo::consume(&pool, paid.id).await.unwrap());

    // Exhausted: the third consume is a no-op, not an error, and the balance
    // never goes negative.
    assert!(!EntitlementRepo::consume(&pool, paid.id).await.unwrap());
    let after = EntitlementRepo::find_by_id(&pool, paid.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.sessions_remaining, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn reconcile_expiry_is_idempotent(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let paid =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;
    let now = Utc::now();
    backdate_validity(&pool, paid.id, now - Duration::days(1)).await;

    // Inside the window nothing happens; past it, exactly one write flips
    // the status.
    assert!(EntitlementRepo::reconcile_expiry(&pool, paid.id, now)
        .await
        .unwrap());
    assert!(!EntitlementRepo::reconcile_expiry(&pool, paid.id, now)
        .await
        .unwrap());

    let after = EntitlementRepo::find_by_id(&pool, paid.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.validity_status, VALIDITY_EXPIRED);
    assert!(!after.is_authorizing(now));
}

#[sqlx::test(migrations = "./migrations")]
async fn expired_entitlement_does_not_authorize_even_with_credit(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let paid =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;
    let now = Utc::now();
    backdate_validity(&pool, paid.id, now - Duration::hours(1)).await;

    let stale = EntitlementRepo::find_by_id(&pool, paid.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stale.sessions_remaining, 4);
    assert!(!stale.is_authorizing(now));
    assert!(stale.needs_expiry_reconcile(now));
}

#[sqlx::test(migrations = "./migrations")]
async fn renewal_clones_terms_with_fresh_grant(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let paid =
        paid_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;

    // Drain and expire the source.
    for _ in 0..4 {
        EntitlementRepo::consume(&pool, paid.id).await.unwrap();
    }
    EntitlementRepo::mark_expired(&pool, paid.id).await.unwrap();
    let source = EntitlementRepo::find_by_id(&pool, paid.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source.validity_status, VALIDITY_EXPIRED);

    let renewal = EntitlementRepo::renew(&pool, &source).await.unwrap();
    assert_eq!(renewal.renews_entitlement_id, Some(source.id));
    assert_eq!(renewal.payment_status, PAYMENT_PENDING);
    assert_eq!(renewal.validity_status, VALIDITY_PENDING);
    assert_eq!(renewal.sessions_per_period, source.sessions_per_period);

    // Activation grants the full count, independent of the drained source.
    let activated = EntitlementRepo::activate(&pool, renewal.id, Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(activated.sessions_remaining, 4);

    // The source is superseded, not mutated.
    let source_after = EntitlementRepo::find_by_id(&pool, source.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source_after.sessions_remaining, 0);
    assert_eq!(source_after.validity_status, VALIDITY_EXPIRED);
}

#[sqlx::test(migrations = "./migrations")]
async fn gateway_failure_and_expiry_callbacks(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let issued =
        issued_entitlement(&pool, student.student_id, tutor.tutor_id, subject, level, 4).await;

    let failed = EntitlementRepo::mark_failed(&pool, issued.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.payment_status, "failed");
    assert!(!failed.is_authorizing(Utc::now()));

    let expired = EntitlementRepo::mark_expired(&pool, issued.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(expired.validity_status, VALIDITY_EXPIRED);
}

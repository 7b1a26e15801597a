//! Integration tests for the hire gate: request transitions, resubmission,
//! and the at-most-one-active-record invariant.

mod common;

use sqlx::PgPool;
use tutorlane_core::hire::{STATUS_ACCEPTED, STATUS_PENDING, STATUS_REJECTED};
use tutorlane_db::repositories::HireRepo;

use common::*;

#[sqlx::test(migrations = "./migrations")]
async fn first_request_creates_pending_record(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let record = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();
    assert_eq!(record.status, STATUS_PENDING);

    let found = HireRepo::find_for_pair(&pool, student.student_id, tutor.tutor_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, record.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_active_record_violates_unique_index(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();

    // A second non-rejected record for the same pair must be impossible at
    // the schema level, whatever the application layer does.
    let result =
        HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level).await;
    let err = result.unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_hire_records_active"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn rejected_record_can_coexist_then_resubmit(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let record = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();
    HireRepo::set_status(&pool, record.id, STATUS_REJECTED)
        .await
        .unwrap()
        .unwrap();

    let resubmitted = HireRepo::resubmit(&pool, record.id, subject, level)
        .await
        .unwrap()
        .expect("rejected record resubmits in place");
    assert_eq!(resubmitted.id, record.id);
    assert_eq!(resubmitted.status, STATUS_PENDING);
    assert!(resubmitted.hired_at >= record.hired_at);
}

#[sqlx::test(migrations = "./migrations")]
async fn resubmit_purges_stale_duplicates(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let record = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();
    HireRepo::set_status(&pool, record.id, STATUS_REJECTED)
        .await
        .unwrap()
        .unwrap();

    // A stale second rejected row for the same pair (rejected rows are not
    // covered by the partial unique index).
    let stale = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();
    HireRepo::set_status(&pool, stale.id, STATUS_REJECTED)
        .await
        .unwrap()
        .unwrap();

    HireRepo::resubmit(&pool, record.id, subject, level)
        .await
        .unwrap()
        .unwrap();

    let remaining = HireRepo::list_for_student(&pool, student.student_id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, record.id);
    assert_eq!(remaining[0].status, STATUS_PENDING);
}

#[sqlx::test(migrations = "./migrations")]
async fn resubmit_requires_rejected_source(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let record = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();

    // Still pending: nothing to resubmit.
    let result = HireRepo::resubmit(&pool, record.id, subject, level)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn full_cycle_pending_rejected_pending_accepted(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;
    let (subject, level) = (subject_id(&pool).await, level_id(&pool).await);

    let record = HireRepo::create(&pool, student.student_id, tutor.tutor_id, subject, level)
        .await
        .unwrap();
    HireRepo::set_status(&pool, record.id, STATUS_REJECTED)
        .await
        .unwrap()
        .unwrap();
    HireRepo::resubmit(&pool, record.id, subject, level)
        .await
        .unwrap()
        .unwrap();
    let accepted = HireRepo::set_status(&pool, record.id, STATUS_ACCEPTED)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(accepted.status, STATUS_ACCEPTED);
    let active = HireRepo::find_accepted(&pool, student.student_id, tutor.tutor_id)
        .await
        .unwrap();
    assert!(active.is_some());
}

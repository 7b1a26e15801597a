//! Integration tests for standalone tutor reviews and their aggregates.

mod common;

use sqlx::PgPool;
use tutorlane_db::repositories::{ParentRepo, ReviewRepo, StudentRepo, TutorRepo, UserRepo};
use tutorlane_db::models::user::CreateUser;

use common::*;

#[sqlx::test(migrations = "./migrations")]
async fn student_review_upserts_in_place(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let student = create_student(&pool, "Sam Student").await;

    let first = ReviewRepo::upsert_student_review(&pool, student.student_id, tutor.tutor_id, 5, "great")
        .await
        .unwrap();
    let second = ReviewRepo::upsert_student_review(&pool, student.student_id, tutor.tutor_id, 3, "ok")
        .await
        .unwrap();

    // Same row, updated rating.
    assert_eq!(first.id, second.id);
    assert_eq!(second.rating, 3);
    assert_eq!(second.review_text, "ok");

    let summary = ReviewRepo::summary_for_tutor(&pool, tutor.tutor_id)
        .await
        .unwrap();
    assert_eq!(summary.review_count, 1);
    assert_eq!(summary.average_rating, Some(3.0));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_parent_review_violates_unique_index(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    let parent_user = UserRepo::create(
        &pool,
        &CreateUser {
            full_name: "Pat Parent".to_string(),
            email: "pat@parents.test".to_string(),
            password_hash: "x".to_string(),
            role: "parent".to_string(),
            account_status: Some("active".to_string()),
        },
    )
    .await
    .unwrap();
    let parent = ParentRepo::create(&pool, parent_user.id).await.unwrap();

    ReviewRepo::create_parent_review(&pool, parent.id, tutor.tutor_id, 4, "good with my kids")
        .await
        .unwrap();

    let err = ReviewRepo::create_parent_review(&pool, parent.id, tutor.tutor_id, 5, "")
        .await
        .unwrap_err();
    match err {
        sqlx::Error::Database(db_err) => {
            assert_eq!(db_err.constraint(), Some("uq_tutor_reviews_parent"));
        }
        other => panic!("expected unique violation, got {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn summary_averages_across_reviewers(pool: PgPool) {
    let tutor = create_tutor(&pool, "Ada Tutor").await;
    for (i, rating) in [5i16, 4, 4].into_iter().enumerate() {
        let student = create_student(&pool, &format!("Student {i}")).await;
        ReviewRepo::upsert_student_review(&pool, student.student_id, tutor.tutor_id, rating, "")
            .await
            .unwrap();
    }

    let summary = ReviewRepo::summary_for_tutor(&pool, tutor.tutor_id)
        .await
        .unwrap();
    assert_eq!(summary.review_count, 3);
    // Raw mean; the API layer rounds to one decimal before publishing.
    let avg = summary.average_rating.unwrap();
    assert!((avg - 4.333).abs() < 0.01);

    TutorRepo::set_average_rating(&pool, tutor.tutor_id, 4.3)
        .await
        .unwrap();
    let profile = TutorRepo::find_by_id(&pool, tutor.tutor_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.average_rating, 4.3);
}

#[sqlx::test(migrations = "./migrations")]
async fn child_student_ids_resolves_parent_children(pool: PgPool) {
    let parent_user = UserRepo::create(
        &pool,
        &CreateUser {
            full_name: "Pat Parent".to_string(),
            email: "pat@parents.test".to_string(),
            password_hash: "x".to_string(),
            role: "parent".to_string(),
            account_status: Some("active".to_string()),
        },
    )
    .await
    .unwrap();
    let parent = ParentRepo::create(&pool, parent_user.id).await.unwrap();

    let child_user = UserRepo::create(
        &pool,
        &CreateUser {
            full_name: "Kid Student".to_string(),
            email: "kid@students.test".to_string(),
            password_hash: "x".to_string(),
            role: "student".to_string(),
            account_status: Some("active".to_string()),
        },
    )
    .await
    .unwrap();
    let child = StudentRepo::create(&pool, child_user.id, None, Some(parent.id))
        .await
        .unwrap();

    let children = ParentRepo::child_student_ids(&pool, parent.id).await.unwrap();
    assert_eq!(children, vec![child.id]);
}

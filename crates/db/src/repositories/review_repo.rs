//! Repository for the `tutor_reviews` table.

use sqlx::PgPool;
use tutorlane_core::types::DbId;

use crate::models::review::{ReviewSummary, TutorReview, REVIEW_TYPE_PARENT, REVIEW_TYPE_STUDENT};

const COLUMNS: &str = "\
    id, tutor_id, student_id, parent_id, rating, review_text, review_type, \
    created_at, updated_at";

/// CRUD for standalone tutor reviews.
pub struct ReviewRepo;

impl ReviewRepo {
    /// A student's review of a tutor, if any.
    pub async fn find_by_student(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<TutorReview>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tutor_reviews WHERE student_id = $1 AND tutor_id = $2"
        );
        sqlx::query_as::<_, TutorReview>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .fetch_optional(pool)
            .await
    }

    /// A parent's review of a tutor, if any.
    pub async fn find_by_parent(
        pool: &PgPool,
        parent_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<TutorReview>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tutor_reviews WHERE parent_id = $1 AND tutor_id = $2"
        );
        sqlx::query_as::<_, TutorReview>(&query)
            .bind(parent_id)
            .bind(tutor_id)
            .fetch_optional(pool)
            .await
    }

    /// Create or update a student's review in place (one per pair).
    pub async fn upsert_student_review(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
        rating: i16,
        review_text: &str,
    ) -> Result<TutorReview, sqlx::Error> {
        let query = format!(
            "INSERT INTO tutor_reviews (tutor_id, student_id, rating, review_text, review_type) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (student_id, tutor_id) WHERE student_id IS NOT NULL \
             DO UPDATE SET rating = $3, review_text = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutorReview>(&query)
            .bind(tutor_id)
            .bind(student_id)
            .bind(rating)
            .bind(review_text)
            .bind(REVIEW_TYPE_STUDENT)
            .fetch_one(pool)
            .await
    }

    /// Create a parent's review. Duplicates surface as a unique violation on
    /// `uq_tutor_reviews_parent`, which the API layer maps to a conflict.
    pub async fn create_parent_review(
        pool: &PgPool,
        parent_id: DbId,
        tutor_id: DbId,
        rating: i16,
        review_text: &str,
    ) -> Result<TutorReview, sqlx::Error> {
        let query = format!(
            "INSERT INTO tutor_reviews (tutor_id, parent_id, rating, review_text, review_type) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TutorReview>(&query)
            .bind(tutor_id)
            .bind(parent_id)
            .bind(rating)
            .bind(review_text)
            .bind(REVIEW_TYPE_PARENT)
            .fetch_one(pool)
            .await
    }

    /// List a tutor's reviews, newest first.
    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<Vec<TutorReview>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM tutor_reviews WHERE tutor_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, TutorReview>(&query)
            .bind(tutor_id)
            .fetch_all(pool)
            .await
    }

    /// Count and mean rating over all of a tutor's reviews.
    pub async fn summary_for_tutor(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<ReviewSummary, sqlx::Error> {
        sqlx::query_as::<_, ReviewSummary>(
            "SELECT COUNT(*) AS review_count, \
                    AVG(rating)::DOUBLE PRECISION AS average_rating \
             FROM tutor_reviews WHERE tutor_id = $1",
        )
        .bind(tutor_id)
        .fetch_one(pool)
        .await
    }
}

//! Standalone tutor review rows.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// Review submitted by a student.
pub const REVIEW_TYPE_STUDENT: &str = "student";

/// Review submitted by a parent on behalf of their children.
pub const REVIEW_TYPE_PARENT: &str = "parent";

/// A row from the `tutor_reviews` table. Exactly one of `student_id` /
/// `parent_id` is set, matching `review_type`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorReview {
    pub id: DbId,
    pub tutor_id: DbId,
    pub student_id: Option<DbId>,
    pub parent_id: Option<DbId>,
    pub rating: i16,
    pub review_text: String,
    pub review_type: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for submitting or updating a review.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitReview {
    pub rating: i16,
    pub review_text: Option<String>,
}

/// Aggregate figures over a tutor's reviews.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReviewSummary {
    pub review_count: i64,
    pub average_rating: Option<f64>,
}

//! Handlers for standalone tutor reviews and the review-based profile
//! average.
//!
//! One review per (reviewer, tutor) pair. Students re-review in place;
//! parents get a conflict on a duplicate. Every create/update recomputes
//! the tutor's published average as the mean of all review ratings.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use tutorlane_core::error::CoreError;
use tutorlane_core::rating;
use tutorlane_core::types::DbId;
use tutorlane_db::models::review::SubmitReview;
use tutorlane_db::models::user::{ROLE_PARENT, ROLE_STUDENT};
use tutorlane_db::repositories::{
    EntitlementRepo, HireRepo, ParentRepo, ReviewRepo, TutorRepo,
};

use crate::error::{AppError, AppResult};
use crate::handlers::{require_parent, require_student};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/tutors/{tutor_id}/reviews
///
/// Submit a review. Students must have hired the tutor and hold a currently
/// valid entitlement; parents must have a child with an accepted hire.
pub async fn submit_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
    Json(input): Json<SubmitReview>,
) -> AppResult<impl IntoResponse> {
    rating::validate_rating(input.rating)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let review_text = input.review_text.unwrap_or_default();
    if review_text.len() > rating::MAX_REVIEW_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Review text must be at most {} characters",
            rating::MAX_REVIEW_LEN
        ))));
    }

    ensure_tutor_exists(&state, tutor_id).await?;

    let (review, created) = match auth.role.as_str() {
        ROLE_STUDENT => {
            submit_student_review(&state, &auth, tutor_id, input.rating, &review_text).await?
        }
        ROLE_PARENT => {
            submit_parent_review(&state, &auth, tutor_id, input.rating, &review_text).await?
        }
        other => {
            return Err(AppError::Core(CoreError::Forbidden(format!(
                "Role '{other}' cannot review tutors"
            ))));
        }
    };

    // Recompute the tutor's published average over all reviews.
    let summary = ReviewRepo::summary_for_tutor(&state.pool, tutor_id).await?;
    let average = summary
        .average_rating
        .map(rating::round_one_decimal)
        .unwrap_or(0.0);
    TutorRepo::set_average_rating(&state.pool, tutor_id, average).await?;

    tracing::info!(
        tutor_id,
        review_id = review.id,
        rating = review.rating,
        average,
        "Tutor review recorded"
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: review })))
}

async fn submit_student_review(
    state: &AppState,
    auth: &AuthUser,
    tutor_id: DbId,
    rating_value: i16,
    review_text: &str,
) -> Result<(tutorlane_db::models::review::TutorReview, bool), AppError> {
    let student = require_student(&state.pool, auth).await?;

    if HireRepo::find_for_pair(&state.pool, student.id, tutor_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only review tutors you have hired".into(),
        )));
    }

    // A currently valid payment with this tutor is required to review.
    let now = Utc::now();
    let entitlement =
        EntitlementRepo::find_latest_paid_active_for_pair(&state.pool, student.id, tutor_id)
            .await?;
    let entitlement = match entitlement {
        Some(e) if e.needs_expiry_reconcile(now) => {
            EntitlementRepo::reconcile_expiry(&state.pool, e.id, now).await?;
            None
        }
        other => other,
    };
    match entitlement {
        Some(e) if e.is_authorizing(now) => {}
        Some(_) | None => {
            return Err(AppError::Core(CoreError::Forbidden(
                "You can only review tutors after making a payment that is still valid".into(),
            )));
        }
    }

    let existed = ReviewRepo::find_by_student(&state.pool, student.id, tutor_id)
        .await?
        .is_some();
    let review = ReviewRepo::upsert_student_review(
        &state.pool,
        student.id,
        tutor_id,
        rating_value,
        review_text,
    )
    .await?;
    Ok((review, !existed))
}

async fn submit_parent_review(
    state: &AppState,
    auth: &AuthUser,
    tutor_id: DbId,
    rating_value: i16,
    review_text: &str,
) -> Result<(tutorlane_db::models::review::TutorReview, bool), AppError> {
    let parent = require_parent(&state.pool, auth).await?;

    if ReviewRepo::find_by_parent(&state.pool, parent.id, tutor_id)
        .await?
        .is_some()
    {
        return Err(AppError::Core(CoreError::Conflict(
            "You have already reviewed this tutor".into(),
        )));
    }

    let children = ParentRepo::child_student_ids(&state.pool, parent.id).await?;
    if children.is_empty()
        || !HireRepo::any_accepted_for_students(&state.pool, &children, tutor_id).await?
    {
        return Err(AppError::Core(CoreError::Forbidden(
            "You can only review tutors hired by your children".into(),
        )));
    }

    let review = ReviewRepo::create_parent_review(
        &state.pool,
        parent.id,
        tutor_id,
        rating_value,
        review_text,
    )
    .await?;
    Ok((review, true))
}

/// GET /api/v1/tutors/{tutor_id}/reviews
///
/// All reviews for a tutor plus the aggregate figures.
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_tutor_exists(&state, tutor_id).await?;
    let reviews = ReviewRepo::list_for_tutor(&state.pool, tutor_id).await?;
    let summary = ReviewRepo::summary_for_tutor(&state.pool, tutor_id).await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({
            "reviews": reviews,
            "review_count": summary.review_count,
            "average_rating": summary.average_rating.map(rating::round_one_decimal),
        }),
    }))
}

async fn ensure_tutor_exists(state: &AppState, tutor_id: DbId) -> Result<(), AppError> {
    TutorRepo::find_by_id(&state.pool, tutor_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "TutorProfile",
                id: tutor_id,
            })
        })
}

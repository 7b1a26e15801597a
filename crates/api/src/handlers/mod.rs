//! HTTP handlers, one module per domain.

pub mod availability;
pub mod entitlements;
pub mod health;
pub mod hires;
pub mod reviews;
pub mod sessions;
pub mod tutors;

use tutorlane_core::error::CoreError;
use tutorlane_db::models::student::{ParentProfile, StudentProfile};
use tutorlane_db::models::tutor::TutorProfile;
use tutorlane_db::repositories::{ParentRepo, StudentRepo, TutorRepo};
use tutorlane_db::DbPool;

use crate::error::AppError;
use crate::middleware::auth::AuthUser;

/// Resolve the authenticated user's tutor profile or fail with 404.
pub(crate) async fn require_tutor(
    pool: &DbPool,
    auth: &AuthUser,
) -> Result<TutorProfile, AppError> {
    TutorRepo::find_by_user(pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "TutorProfile",
                id: auth.user_id,
            })
        })
}

/// Resolve the authenticated user's student profile or fail with 404.
pub(crate) async fn require_student(
    pool: &DbPool,
    auth: &AuthUser,
) -> Result<StudentProfile, AppError> {
    StudentRepo::find_by_user(pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "StudentProfile",
                id: auth.user_id,
            })
        })
}

/// Resolve the authenticated user's parent profile or fail with 404.
pub(crate) async fn require_parent(
    pool: &DbPool,
    auth: &AuthUser,
) -> Result<ParentProfile, AppError> {
    ParentRepo::find_by_user(pool, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "ParentProfile",
                id: auth.user_id,
            })
        })
}

/// Require the gateway/admin role for payment-callback endpoints.
pub(crate) fn require_admin(auth: &AuthUser) -> Result<(), AppError> {
    if auth.role == tutorlane_db::models::user::ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Payment gateway callbacks require the admin role".into(),
        )))
    }
}

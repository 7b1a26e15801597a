//! Handlers for tutor profiles, level terms, and earnings statistics.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use tutorlane_core::error::CoreError;
use tutorlane_core::types::DbId;
use tutorlane_db::models::tutor::UpsertLevelTerms;
use tutorlane_db::repositories::TutorRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::require_tutor;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/tutors/{tutor_id}
pub async fn get_tutor(
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = TutorRepo::find_by_id(&state.pool, tutor_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "TutorProfile",
                id: tutor_id,
            })
        })?;
    Ok(Json(DataResponse { data: tutor }))
}

/// GET /api/v1/tutors/{tutor_id}/level-terms
///
/// The tutor's published commercial terms per academic level (catalog data
/// consumed when issuing entitlements and enforcing the session cap).
pub async fn list_level_terms(
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let terms = TutorRepo::list_level_terms(&state.pool, tutor_id).await?;
    Ok(Json(DataResponse { data: terms }))
}

/// PUT /api/v1/tutors/me/level-terms
///
/// Set or replace the authenticated tutor's terms for one level.
pub async fn upsert_level_terms(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpsertLevelTerms>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;

    if !input.hourly_rate.is_finite() || input.hourly_rate < 0.0 {
        return Err(AppError::Core(CoreError::Validation(
            "Hourly rate must be a non-negative number".into(),
        )));
    }
    if let Some(discount) = input.discount_percent {
        if !(0.0..=100.0).contains(&discount) {
            return Err(AppError::Core(CoreError::Validation(
                "Discount must be between 0 and 100 percent".into(),
            )));
        }
    }
    if input.sessions_per_month < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Sessions per month must be non-negative".into(),
        )));
    }

    let terms = TutorRepo::upsert_level_terms(&state.pool, tutor.id, &input).await?;
    tracing::info!(tutor_id = tutor.id, level_id = input.level_id, "Level terms updated");
    Ok(Json(DataResponse { data: terms }))
}

/// DELETE /api/v1/tutors/me/level-terms/{level_id}
pub async fn remove_level_terms(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(level_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    if !TutorRepo::remove_level_terms(&state.pool, tutor.id, level_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "LevelTerms",
            id: level_id,
        }));
    }
    Ok(Json(DataResponse { data: serde_json::json!({ "removed": true }) }))
}

/// GET /api/v1/tutors/me/stats
///
/// Earnings summary over the authenticated tutor's completed sessions.
pub async fn get_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let stats = TutorRepo::stats(&state.pool, tutor.id).await?;
    Ok(Json(DataResponse { data: stats }))
}

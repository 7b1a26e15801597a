//! Handlers for tutor availability calendars.
//!
//! Mutations are owner-only and take effect immediately for future queries;
//! they never retroactively invalidate already-created sessions. The checks
//! here are advisory; the session scheduler's conflict check against
//! existing sessions is authoritative.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use tutorlane_core::availability::{
    self, enumerate_slots, is_available, MAX_DURATION_MINUTES,
};
use tutorlane_core::error::CoreError;
use tutorlane_core::types::{DbId, Timestamp};
use tutorlane_db::models::availability::{CreateBlackout, UpdateAvailability, UpdateBlackout};
use tutorlane_db::repositories::{AvailabilityRepo, TutorRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::require_tutor;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query string for slot enumeration.
#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// Query string for the advisory availability check.
#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub at: Timestamp,
    pub duration_minutes: Option<i32>,
}

/// GET /api/v1/tutors/{tutor_id}/availability
///
/// The tutor's calendar, bootstrapped with defaults on first read.
pub async fn get_availability(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_tutor_exists(&state, tutor_id).await?;
    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor_id).await?;
    Ok(Json(DataResponse { data: calendar }))
}

/// PUT /api/v1/tutors/me/availability
///
/// Update the authenticated tutor's general availability settings. Only
/// provided fields are applied.
pub async fn update_availability(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateAvailability>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;

    if let Some(durations) = &input.session_durations {
        availability::validate_durations(durations)
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    if let Some(windows) = &input.windows {
        for window in windows {
            if !(0..7).contains(&i32::from(window.weekday)) {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "Weekday {} is out of range (0 = Monday .. 6 = Sunday)",
                    window.weekday
                ))));
            }
            if window.end_time <= window.start_time {
                return Err(AppError::Core(CoreError::Validation(
                    "Window end must be after its start".into(),
                )));
            }
        }
    }
    if let Some(notice) = input.min_notice_hours {
        if notice < 0 {
            return Err(AppError::Core(CoreError::Validation(
                "Minimum notice must be non-negative".into(),
            )));
        }
    }
    if let Some(advance) = input.max_advance_days {
        if advance < 1 {
            return Err(AppError::Core(CoreError::Validation(
                "Maximum advance must be at least one day".into(),
            )));
        }
    }

    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor.id).await?;
    AvailabilityRepo::update(&state.pool, calendar.profile.id, &input).await?;
    let refreshed = AvailabilityRepo::find_or_create(&state.pool, tutor.id).await?;

    tracing::info!(tutor_id = tutor.id, "Availability updated");
    Ok(Json(DataResponse { data: refreshed }))
}

/// POST /api/v1/tutors/me/availability/blackouts
///
/// Add a blackout range to the authenticated tutor's calendar.
pub async fn add_blackout(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateBlackout>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    availability::validate_blackout(input.starts_at, input.ends_at)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor.id).await?;
    let blackout = AvailabilityRepo::add_blackout(&state.pool, calendar.profile.id, &input).await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: blackout })))
}

/// PATCH /api/v1/tutors/me/availability/blackouts/{blackout_id}
///
/// Edit a blackout range on the authenticated tutor's calendar.
pub async fn update_blackout(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(blackout_id): Path<DbId>,
    Json(input): Json<UpdateBlackout>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    if let (Some(starts_at), Some(ends_at)) = (input.starts_at, input.ends_at) {
        availability::validate_blackout(starts_at, ends_at)
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }

    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor.id).await?;
    let blackout =
        AvailabilityRepo::update_blackout(&state.pool, calendar.profile.id, blackout_id, &input)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::NotFound {
                    entity: "Blackout",
                    id: blackout_id,
                })
            })?;

    Ok(Json(DataResponse { data: blackout }))
}

/// DELETE /api/v1/tutors/me/availability/blackouts/{blackout_id}
///
/// Remove a blackout range from the authenticated tutor's calendar.
pub async fn remove_blackout(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(blackout_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor.id).await?;

    if !AvailabilityRepo::remove_blackout(&state.pool, calendar.profile.id, blackout_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Blackout",
            id: blackout_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/tutors/{tutor_id}/availability/slots?date=YYYY-MM-DD
///
/// Candidate slots for one day: each configured duration, stepped at
/// 30-minute granularity inside the day's window.
pub async fn get_slots(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
    Query(query): Query<SlotsQuery>,
) -> AppResult<impl IntoResponse> {
    ensure_tutor_exists(&state, tutor_id).await?;
    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor_id).await?;
    let slots = enumerate_slots(&calendar.to_config(), query.date);
    Ok(Json(DataResponse {
        data: serde_json::json!({
            "date": query.date,
            "slots": slots
                .iter()
                .map(|s| serde_json::json!({
                    "start": s.start,
                    "end": s.end,
                    "duration_minutes": s.duration_minutes,
                }))
                .collect::<Vec<_>>(),
        }),
    }))
}

/// GET /api/v1/tutors/{tutor_id}/availability/check?at=...
///
/// Advisory availability check for a candidate instant.
pub async fn check_availability(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
    Query(query): Query<CheckQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(duration) = query.duration_minutes {
        if duration <= 0 || duration > MAX_DURATION_MINUTES {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Duration {duration} is out of range (1..={MAX_DURATION_MINUTES} minutes)"
            ))));
        }
    }

    ensure_tutor_exists(&state, tutor_id).await?;
    let calendar = AvailabilityRepo::find_or_create(&state.pool, tutor_id).await?;
    let available = is_available(&calendar.to_config(), query.at);

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "at": query.at,
            "is_available": available,
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

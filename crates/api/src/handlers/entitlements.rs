//! Handlers for the entitlement ledger: student views, renewal, and the
//! payment gateway's callback surface.
//!
//! Expiry is applied lazily: read paths call the idempotent
//! `reconcile_expiry` write when a row's window has lapsed, instead of a
//! background sweep.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use tutorlane_core::entitlement;
use tutorlane_core::error::CoreError;
use tutorlane_core::types::DbId;
use tutorlane_db::models::entitlement::{Entitlement, StudentAuthorization};
use tutorlane_db::repositories::EntitlementRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::{require_admin, require_student};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query string for the pair-status check.
#[derive(Debug, Deserialize)]
pub struct PairStatusQuery {
    pub subject_id: DbId,
    pub level_id: DbId,
}

/// GET /api/v1/entitlements
///
/// The authenticated student's entitlements, newest first, with lazy expiry
/// applied.
pub async fn list_my_entitlements(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;
    let now = Utc::now();

    let mut entitlements = EntitlementRepo::list_for_student(&state.pool, student.id).await?;
    for entitlement in &mut entitlements {
        if entitlement.needs_expiry_reconcile(now) {
            EntitlementRepo::reconcile_expiry(&state.pool, entitlement.id, now).await?;
            entitlement.validity_status = entitlement::VALIDITY_EXPIRED.to_string();
        }
    }

    Ok(Json(DataResponse { data: entitlements }))
}

/// POST /api/v1/entitlements/{entitlement_id}/renew
///
/// Clone an expired entitlement into a fresh pending one with a renewal
/// back-reference. Only the owning student may renew, and only once the
/// source is expired.
pub async fn renew_entitlement(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(entitlement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;
    let now = Utc::now();

    let source = find_reconciled(&state, entitlement_id, now).await?;
    if source.student_id != student.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this entitlement".into(),
        )));
    }

    entitlement::validate_renewable(&source.validity_status)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let renewed = EntitlementRepo::renew(&state.pool, &source).await?;
    tracing::info!(
        source_id = source.id,
        renewal_id = renewed.id,
        student_id = student.id,
        "Entitlement renewal created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: renewed })))
}

/// GET /api/v1/tutors/{tutor_id}/entitlement-status
///
/// The authenticated student's authorization standing against one tutor for
/// a subject/level, the figure used to route students to payment.
pub async fn pair_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(tutor_id): Path<DbId>,
    Query(query): Query<PairStatusQuery>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;
    let now = Utc::now();

    let candidate = EntitlementRepo::find_latest_paid_active(
        &state.pool,
        student.id,
        tutor_id,
        query.subject_id,
        query.level_id,
    )
    .await?;

    let verdict = match candidate {
        Some(e) => {
            let e = if e.needs_expiry_reconcile(now) {
                EntitlementRepo::reconcile_expiry(&state.pool, e.id, now).await?;
                find_reconciled(&state, e.id, now).await?
            } else {
                e
            };
            StudentAuthorization::from_entitlement(&e, now)
        }
        None => {
            let latest = EntitlementRepo::find_latest_for_tuple(
                &state.pool,
                student.id,
                tutor_id,
                query.subject_id,
                query.level_id,
            )
            .await?;
            match latest {
                Some(e) => StudentAuthorization::from_entitlement(&e, now),
                None => StudentAuthorization::missing(student.id),
            }
        }
    };

    Ok(Json(DataResponse { data: verdict }))
}

// ---------------------------------------------------------------------------
// Payment gateway callbacks
// ---------------------------------------------------------------------------

/// POST /api/v1/payments/entitlements/{entitlement_id}/activate
///
/// Gateway success callback: payment `paid`, validity `active`, fresh 30-day
/// window, full session grant. Re-activating an already-paid entitlement is
/// rejected as a conflict.
pub async fn activate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(entitlement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth)?;
    ensure_exists(&state, entitlement_id).await?;

    let activated = EntitlementRepo::activate(&state.pool, entitlement_id, Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict("Payment already processed".into()))
        })?;

    tracing::info!(entitlement_id, "Entitlement activated by payment gateway");
    Ok(Json(DataResponse { data: activated }))
}

/// POST /api/v1/payments/entitlements/{entitlement_id}/fail
///
/// Gateway failure callback: payment `failed`.
pub async fn mark_failed(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(entitlement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth)?;
    let updated = EntitlementRepo::mark_failed(&state.pool, entitlement_id)
        .await?
        .ok_or_else(|| not_found(entitlement_id))?;

    tracing::warn!(entitlement_id, "Entitlement payment failed");
    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/payments/entitlements/{entitlement_id}/expire
///
/// Gateway checkout-expiry callback: validity `expired`.
pub async fn mark_expired(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(entitlement_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_admin(&auth)?;
    let updated = EntitlementRepo::mark_expired(&state.pool, entitlement_id)
        .await?
        .ok_or_else(|| not_found(entitlement_id))?;

    tracing::info!(entitlement_id, "Entitlement checkout expired");
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn not_found(entitlement_id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Entitlement",
        id: entitlement_id,
    })
}

async fn ensure_exists(state: &AppState, entitlement_id: DbId) -> Result<(), AppError> {
    EntitlementRepo::find_by_id(&state.pool, entitlement_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found(entitlement_id))
}

/// Fetch an entitlement, applying the lazy expiry reconciliation first.
async fn find_reconciled(
    state: &AppState,
    entitlement_id: DbId,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Entitlement, AppError> {
    let entitlement = EntitlementRepo::find_by_id(&state.pool, entitlement_id)
        .await?
        .ok_or_else(|| not_found(entitlement_id))?;
    if entitlement.needs_expiry_reconcile(now) {
        EntitlementRepo::reconcile_expiry(&state.pool, entitlement.id, now).await?;
        return EntitlementRepo::find_by_id(&state.pool, entitlement_id)
            .await?
            .ok_or_else(|| not_found(entitlement_id));
    }
    Ok(entitlement)
}

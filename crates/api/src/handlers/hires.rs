//! Handlers for the hire/authorization gate.
//!
//! A hire must be `accepted` before any entitlement or session can exist for
//! a (student, tutor) pair. Acceptance issues the first entitlement as a
//! side effect, guarded so repeat decisions never duplicate it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use tutorlane_core::entitlement::PAYMENT_TYPE_MONTHLY;
use tutorlane_core::error::CoreError;
use tutorlane_core::hire::{self, RequestDecision};
use tutorlane_core::types::DbId;
use tutorlane_db::models::entitlement::IssueEntitlement;
use tutorlane_db::models::hire::{RequestHire, RespondToHire};
use tutorlane_db::models::tutor::LevelTerms;
use tutorlane_db::repositories::{EntitlementRepo, HireRepo, TutorRepo};
use tutorlane_events::bus::{EVENT_ENTITLEMENT_ISSUED, EVENT_HIRE_DECIDED};
use tutorlane_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::{require_student, require_tutor};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query string for the tutor's hire list.
#[derive(Debug, Deserialize)]
pub struct HireListQuery {
    pub status: Option<String>,
}

/// POST /api/v1/hires
///
/// Student requests to hire a tutor. A rejected record for the same pair is
/// resubmitted in place; accepted/pending records reject the request.
pub async fn request_hire(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RequestHire>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;

    let tutor = TutorRepo::find_by_id(&state.pool, input.tutor_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "TutorProfile",
                id: input.tutor_id,
            })
        })?;

    let existing = HireRepo::find_for_pair(&state.pool, student.id, tutor.id).await?;
    let decision = hire::decide_request(existing.as_ref().map(|h| h.status.as_str()))
        .map_err(|msg| AppError::Core(CoreError::Conflict(msg)))?;

    let record = match (decision, existing) {
        (RequestDecision::Create, _) => {
            HireRepo::create(
                &state.pool,
                student.id,
                tutor.id,
                input.subject_id,
                input.level_id,
            )
            .await?
        }
        (RequestDecision::Resubmit, Some(rejected)) => {
            HireRepo::resubmit(&state.pool, rejected.id, input.subject_id, input.level_id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Conflict(
                        "Hire request changed state before it could be resubmitted".into(),
                    ))
                })?
        }
        (RequestDecision::Resubmit, None) => {
            return Err(AppError::InternalError(
                "Resubmit decision without an existing record".into(),
            ));
        }
    };

    tracing::info!(
        student_id = student.id,
        tutor_id = tutor.id,
        hire_id = record.id,
        "Hire requested"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: record })))
}

/// POST /api/v1/hires/{hire_id}/respond
///
/// Tutor accepts or rejects a hire request. On accept, issues the first
/// entitlement for the tuple using the tutor's current level terms,
/// exactly once, and never failing the acceptance itself.
pub async fn respond_to_hire(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(hire_id): Path<DbId>,
    Json(input): Json<RespondToHire>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;

    let record = HireRepo::find_by_id(&state.pool, hire_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "HireRecord",
                id: hire_id,
            })
        })?;
    if record.tutor_id != tutor.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Hire request not found for this tutor".into(),
        )));
    }

    let new_status = hire::decision_status(&input.action)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let updated = HireRepo::set_status(&state.pool, record.id, new_status)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "HireRecord",
                id: hire_id,
            })
        })?;

    if new_status == hire::STATUS_ACCEPTED {
        issue_initial_entitlement(&state, &updated).await;
    }

    state.event_bus.publish(
        PlatformEvent::new(EVENT_HIRE_DECIDED)
            .with_source("hire", updated.id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "status": updated.status })),
    );

    tracing::info!(
        hire_id = updated.id,
        tutor_id = tutor.id,
        status = %updated.status,
        "Hire request decided"
    );

    Ok(Json(DataResponse { data: updated }))
}

/// Issue the first entitlement for an accepted hire. Guarded by an existence
/// check so repeat decisions never duplicate; any failure is logged and does
/// not fail the acceptance.
async fn issue_initial_entitlement(state: &AppState, hire: &tutorlane_db::models::hire::HireRecord) {
    let result = try_issue_initial_entitlement(state, hire).await;
    if let Err(err) = result {
        tracing::error!(
            hire_id = hire.id,
            error = %err,
            "Failed to issue entitlement for accepted hire"
        );
    }
}

async fn try_issue_initial_entitlement(
    state: &AppState,
    hire: &tutorlane_db::models::hire::HireRecord,
) -> Result<(), AppError> {
    let existing = EntitlementRepo::find_latest_for_tuple(
        &state.pool,
        hire.student_id,
        hire.tutor_id,
        hire.subject_id,
        hire.level_id,
    )
    .await?;
    if existing.is_some() {
        return Ok(());
    }

    let Some(terms) =
        TutorRepo::level_terms(&state.pool, hire.tutor_id, hire.level_id).await?
    else {
        tracing::warn!(
            hire_id = hire.id,
            level_id = hire.level_id,
            "No level terms configured; skipping entitlement issuance"
        );
        return Ok(());
    };
    if terms.sessions_per_month < 1 {
        tracing::warn!(
            hire_id = hire.id,
            level_id = hire.level_id,
            "Level terms grant no sessions; skipping entitlement issuance"
        );
        return Ok(());
    }

    let entitlement = EntitlementRepo::issue(&state.pool, &issue_input(hire, &terms)).await?;

    state.event_bus.publish(
        PlatformEvent::new(EVENT_ENTITLEMENT_ISSUED)
            .with_source("entitlement", entitlement.id)
            .with_payload(serde_json::json!({
                "student_id": entitlement.student_id,
                "tutor_id": entitlement.tutor_id,
            })),
    );

    tracing::info!(
        hire_id = hire.id,
        entitlement_id = entitlement.id,
        "Entitlement issued for accepted hire"
    );
    Ok(())
}

fn issue_input(
    hire: &tutorlane_db::models::hire::HireRecord,
    terms: &LevelTerms,
) -> IssueEntitlement {
    let monthly_amount = terms.monthly_rate.unwrap_or_else(|| {
        tutorlane_core::entitlement::monthly_amount(
            terms.hourly_rate,
            terms.discount_percent,
            terms.sessions_per_month,
        )
    });
    IssueEntitlement {
        student_id: hire.student_id,
        tutor_id: hire.tutor_id,
        subject_id: hire.subject_id,
        level_id: hire.level_id,
        payment_type: PAYMENT_TYPE_MONTHLY.to_string(),
        base_rate: terms.hourly_rate,
        discount_percent: terms.discount_percent,
        monthly_amount: Some(monthly_amount),
        sessions_per_period: terms.sessions_per_month,
        request_notes: format!(
            "Monthly package: {} sessions per month",
            terms.sessions_per_month
        ),
        currency: "GBP".to_string(),
        renews_entitlement_id: None,
    }
}

/// GET /api/v1/hires
///
/// The authenticated tutor's hire requests, optionally filtered by status.
pub async fn list_tutor_hires(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<HireListQuery>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let status = query.status.as_deref().filter(|s| *s != "all");
    if let Some(status) = status {
        if !hire::VALID_STATUSES.contains(&status) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Invalid status filter '{status}'"
            ))));
        }
    }
    let records = HireRepo::list_for_tutor(&state.pool, tutor.id, status).await?;
    Ok(Json(DataResponse { data: records }))
}

/// GET /api/v1/students/me/hires
///
/// The authenticated student's hire records, newest first.
pub async fn list_student_hires(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;
    let records = HireRepo::list_for_student(&state.pool, student.id).await?;
    Ok(Json(DataResponse { data: records }))
}

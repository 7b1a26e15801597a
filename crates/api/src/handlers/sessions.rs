//! Handlers for the tutoring-session lifecycle: creation, per-student
//! responses, proposed-time negotiation, status transitions, and ratings.
//!
//! Creation preconditions are checked in order, first failure wins:
//! active accounts, accepted hires, the per-level session cap, authorizing
//! entitlements (with a per-student breakdown on failure), and finally the
//! overlap conflict check, which runs inside the insert transaction.

use std::collections::{HashMap, HashSet};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use tutorlane_core::error::CoreError;
use tutorlane_core::rating;
use tutorlane_core::session::{self, state_machine};
use tutorlane_core::types::{DbId, Timestamp};
use tutorlane_db::models::entitlement::StudentAuthorization;
use tutorlane_db::models::session::{
    NewSession, NewSessionStudent, ScheduleOutcome, Session, SessionFilter,
};
use tutorlane_db::models::user::ACCOUNT_ACTIVE;
use tutorlane_db::repositories::session_repo::TransitionOutcome;
use tutorlane_db::repositories::{
    EntitlementRepo, HireRepo, SessionRepo, StudentRepo, TutorRepo, UserRepo,
};
use tutorlane_events::bus::EVENT_SESSION_SCHEDULED;
use tutorlane_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::handlers::{require_student, require_tutor};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Request body for creating a session.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub student_ids: Vec<DbId>,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub starts_at: Timestamp,
    pub duration_hours: f64,
    pub hourly_rate: f64,
    pub notes: Option<String>,
}

/// Request body for a student's response to a session.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub status: String,
    pub note: Option<String>,
}

/// Request body for proposing an alternate start time.
#[derive(Debug, Deserialize)]
pub struct ProposeTimeRequest {
    pub proposed_start: Timestamp,
}

/// Request body for deciding an outstanding proposal.
#[derive(Debug, Deserialize)]
pub struct ProposalDecisionRequest {
    /// `"accept"` or `"reject"`.
    pub action: String,
}

/// Request body for rescheduling a pending session.
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub starts_at: Timestamp,
}

/// Request body for rating a session.
#[derive(Debug, Deserialize)]
pub struct RateSessionRequest {
    pub rating: i16,
    pub feedback: Option<String>,
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions
///
/// Create a tutoring session for 1..N students. The authenticated user must
/// be the tutor.
pub async fn create_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;

    if input.student_ids.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "At least one student is required".into(),
        )));
    }
    session::validate_duration(input.duration_hours)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;
    if !input.hourly_rate.is_finite() || input.hourly_rate < 0.0 {
        return Err(AppError::Core(CoreError::Validation(
            "Hourly rate must be a non-negative number".into(),
        )));
    }

    // 1. Every student account must be active.
    let students = StudentRepo::find_by_ids(&state.pool, &input.student_ids).await?;
    let found: HashSet<DbId> = students.iter().map(|s| s.id).collect();
    if let Some(missing) = input.student_ids.iter().find(|id| !found.contains(id)) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "StudentProfile",
            id: *missing,
        }));
    }

    let user_ids: Vec<DbId> = students.iter().map(|s| s.user_id).collect();
    let users = UserRepo::find_by_ids(&state.pool, &user_ids).await?;
    let users_by_id: HashMap<DbId, _> = users.into_iter().map(|u| (u.id, u)).collect();
    for student in &students {
        let user = users_by_id.get(&student.user_id).ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "User",
                id: student.user_id,
            })
        })?;
        if user.account_status != ACCOUNT_ACTIVE {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Student {} is not verified",
                user.full_name
            ))));
        }
    }

    // 2. Every student must have an accepted hire with this tutor.
    for student in &students {
        if HireRepo::find_accepted(&state.pool, student.id, tutor.id)
            .await?
            .is_none()
        {
            return Err(AppError::Core(CoreError::Forbidden(
                "Tutor is not authorized to create a session with one or more selected students"
                    .into(),
            )));
        }
    }

    // 3. Per-level session cap (checked against the tutor's completed-session
    //    count; see DESIGN.md for the counting window).
    let terms = TutorRepo::level_terms(&state.pool, tutor.id, input.level_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "This academic level is not configured on your profile".into(),
            ))
        })?;
    let completed = SessionRepo::count_completed(&state.pool, tutor.id).await?;
    if completed >= terms.sessions_per_month as i64 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "You have reached the maximum number {} of sessions for this academic level for this month",
            terms.sessions_per_month
        ))));
    }

    // 4. Every student needs an authorizing entitlement; reject with the full
    //    per-student breakdown otherwise.
    let now = Utc::now();
    let mut statuses: Vec<StudentAuthorization> = Vec::with_capacity(students.len());
    let mut links: Vec<NewSessionStudent> = Vec::with_capacity(students.len());
    for student in &students {
        let verdict = authorize_student(
            &state,
            student.id,
            tutor.id,
            input.subject_id,
            input.level_id,
            now,
        )
        .await?;
        if let (true, Some(entitlement_id)) = (verdict.authorized, verdict.entitlement_id) {
            links.push(NewSessionStudent {
                student_id: student.id,
                entitlement_id,
            });
        }
        statuses.push(verdict);
    }
    if statuses.iter().any(|s| !s.authorized) {
        return Err(AppError::EntitlementRequired {
            message: "Payment not completed. Student must pay for academic level access before sessions can be created."
                .into(),
            statuses,
        });
    }

    // 5. Conflict-checked insert, serialized per tutor.
    let meeting_link = format!("https://meet.jit.si/tutorlane-{}", Uuid::new_v4());
    let new_session = NewSession {
        tutor_id: tutor.id,
        subject_id: input.subject_id,
        level_id: input.level_id,
        starts_at: input.starts_at,
        duration_hours: input.duration_hours,
        hourly_rate: input.hourly_rate,
        total_earnings: session::total_earnings(input.hourly_rate, input.duration_hours),
        notes: input.notes.unwrap_or_default(),
        meeting_link,
        students: links,
    };
    let created = match SessionRepo::create(&state.pool, &new_session).await? {
        ScheduleOutcome::Scheduled(session) => session,
        ScheduleOutcome::Overlap => {
            return Err(AppError::Core(CoreError::Conflict(
                "Cannot create new session. Another active session overlaps this time slot."
                    .into(),
            )));
        }
    };

    tracing::info!(
        tutor_id = tutor.id,
        session_id = created.id,
        students = students.len(),
        "Tutoring session created"
    );

    // Notify tutor and students; failure to notify never rolls back the
    // session.
    let mut recipients: Vec<String> = students
        .iter()
        .filter_map(|s| users_by_id.get(&s.user_id).map(|u| u.email.clone()))
        .collect();
    if let Some(tutor_user) = UserRepo::find_by_id(&state.pool, tutor.user_id).await? {
        recipients.push(tutor_user.email);
    }
    state.event_bus.publish(
        PlatformEvent::new(EVENT_SESSION_SCHEDULED)
            .with_source("session", created.id)
            .with_actor(auth.user_id)
            .with_recipients(recipients)
            .with_payload(serde_json::json!({
                "meeting_link": created.meeting_link,
                "starts_at": created.starts_at,
            })),
    );

    let full = SessionRepo::find_with_students(&state.pool, created.id)
        .await?
        .ok_or_else(|| AppError::InternalError("Session vanished after insert".into()))?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: full })))
}

/// Judge one student's entitlement for a (tutor, subject, level) tuple,
/// applying the lazy-expiry reconciliation before judging.
async fn authorize_student(
    state: &AppState,
    student_id: DbId,
    tutor_id: DbId,
    subject_id: DbId,
    level_id: DbId,
    now: Timestamp,
) -> Result<StudentAuthorization, AppError> {
    let candidate = EntitlementRepo::find_latest_paid_active(
        &state.pool,
        student_id,
        tutor_id,
        subject_id,
        level_id,
    )
    .await?;

    let candidate = match candidate {
        Some(entitlement) if entitlement.needs_expiry_reconcile(now) => {
            EntitlementRepo::reconcile_expiry(&state.pool, entitlement.id, now).await?;
            EntitlementRepo::find_by_id(&state.pool, entitlement.id).await?
        }
        other => other,
    };

    if let Some(entitlement) = candidate {
        return Ok(StudentAuthorization::from_entitlement(&entitlement, now));
    }

    // No paid+active entitlement: surface the most recent one (pending
    // payment, expired, ...) as the diagnostic, if there is one.
    let latest = EntitlementRepo::find_latest_for_tuple(
        &state.pool,
        student_id,
        tutor_id,
        subject_id,
        level_id,
    )
    .await?;
    Ok(match latest {
        Some(entitlement) => StudentAuthorization::from_entitlement(&entitlement, now),
        None => StudentAuthorization::missing(student_id),
    })
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// GET /api/v1/sessions
///
/// The authenticated tutor's sessions, filtered and paginated.
pub async fn list_tutor_sessions(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<SessionFilter>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let page = SessionRepo::list_for_tutor(&state.pool, tutor.id, &filter).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/students/me/sessions
///
/// The authenticated student's sessions, filtered and paginated.
pub async fn list_student_sessions(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<SessionFilter>,
) -> AppResult<impl IntoResponse> {
    let student = require_student(&state.pool, &auth).await?;
    let page = SessionRepo::list_for_student(&state.pool, student.id, &filter).await?;
    Ok(Json(DataResponse { data: page }))
}

/// GET /api/v1/sessions/{session_id}
///
/// Session detail with per-student rows. Visible to the owning tutor, the
/// participating students, and admins.
pub async fn get_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let full = SessionRepo::find_with_students(&state.pool, session_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })
        })?;

    let allowed = match auth.role.as_str() {
        "admin" => true,
        _ => {
            let as_tutor = TutorRepo::find_by_user(&state.pool, auth.user_id)
                .await?
                .is_some_and(|t| t.id == full.session.tutor_id);
            let as_student = match StudentRepo::find_by_user(&state.pool, auth.user_id).await? {
                Some(profile) => full.students.iter().any(|s| s.student_id == profile.id),
                None => false,
            };
            as_tutor || as_student
        }
    };
    if !allowed {
        return Err(AppError::Core(CoreError::Forbidden(
            "You are not a participant of this session".into(),
        )));
    }

    Ok(Json(DataResponse { data: full }))
}

// ---------------------------------------------------------------------------
// Student response / rating
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{session_id}/respond
///
/// Upsert the authenticated student's response and recompute the overall
/// status (any confirmed wins; all declined cancels; otherwise pending).
pub async fn respond(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<RespondRequest>,
) -> AppResult<impl IntoResponse> {
    session::validate_response(&input.status)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let student = require_student(&state.pool, &auth).await?;
    ensure_session_exists(&state, session_id).await?;
    ensure_member(&state, session_id, student.id).await?;

    let updated = SessionRepo::respond(
        &state.pool,
        session_id,
        student.id,
        &input.status,
        input.note.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })
    })?;

    tracing::info!(
        session_id,
        student_id = student.id,
        response = %input.status,
        status = %updated.status,
        "Student response recorded"
    );

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sessions/{session_id}/rate
///
/// Upsert the authenticated student's rating. Declined students cannot rate.
/// Recomputes the session aggregate and the tutor's session statistics.
pub async fn rate_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<RateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    rating::validate_rating(input.rating)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let student = require_student(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    let membership = ensure_member(&state, session_id, student.id).await?;

    if membership.response_status == session::RESPONSE_DECLINED {
        return Err(AppError::Core(CoreError::Forbidden(
            "You declined this session and cannot rate it".into(),
        )));
    }

    let updated = SessionRepo::rate(
        &state.pool,
        session_id,
        student.id,
        input.rating,
        input.feedback.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::NotFound {
            entity: "Session",
            id: session_id,
        })
    })?;

    // Refresh the tutor's published session statistics.
    let (rated_count, _) = SessionRepo::rated_session_stats(&state.pool, current.tutor_id).await?;
    TutorRepo::set_total_sessions(&state.pool, current.tutor_id, rated_count as i32).await?;

    tracing::info!(
        session_id,
        student_id = student.id,
        rating = input.rating,
        aggregate = ?updated.rating,
        "Session rated"
    );

    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Proposed-time negotiation
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{session_id}/propose
///
/// Attach a proposed alternate start time. Either party may propose, but
/// only while the session is pending; a confirmed session's schedule is
/// frozen.
pub async fn propose_time(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<ProposeTimeRequest>,
) -> AppResult<impl IntoResponse> {
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_participant(&state, &auth, &current).await?;
    ensure_schedule_mutable(&current)?;

    let updated = SessionRepo::propose_time(&state.pool, session_id, input.proposed_start)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Proposals are only allowed while the session is pending".into(),
            ))
        })?;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sessions/{session_id}/proposal/respond
///
/// The owning tutor accepts or rejects the outstanding proposal. Accepting
/// atomically replaces the start time and confirms the session.
pub async fn respond_to_proposal(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<ProposalDecisionRequest>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;

    match input.action.as_str() {
        "accept" => {
            ensure_schedule_mutable(&current)?;
            match SessionRepo::accept_proposal(&state.pool, session_id).await? {
                TransitionOutcome::Applied(updated) => Ok(Json(DataResponse { data: updated })),
                TransitionOutcome::Overlap => Err(AppError::Core(CoreError::Conflict(
                    "Cannot accept the proposed time. Another active session conflicts.".into(),
                ))),
                TransitionOutcome::InvalidState => Err(AppError::Core(CoreError::Validation(
                    "No pending proposed time on this session".into(),
                ))),
            }
        }
        "reject" => {
            let updated = SessionRepo::reject_proposal(&state.pool, session_id)
                .await?
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation(
                        "No pending proposed time on this session".into(),
                    ))
                })?;
            Ok(Json(DataResponse { data: updated }))
        }
        other => Err(AppError::Core(CoreError::Validation(format!(
            "Invalid action '{other}'. Must be one of: accept, reject"
        )))),
    }
}

/// PATCH /api/v1/sessions/{session_id}/schedule
///
/// Direct reschedule by the owning tutor, only while pending.
pub async fn reschedule(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
    Json(input): Json<RescheduleRequest>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;
    ensure_schedule_mutable(&current)?;

    match SessionRepo::reschedule(&state.pool, session_id, input.starts_at).await? {
        TransitionOutcome::Applied(updated) => Ok(Json(DataResponse { data: updated })),
        TransitionOutcome::Overlap => Err(AppError::Core(CoreError::Conflict(
            "Cannot reschedule. Another active session overlaps the new time slot.".into(),
        ))),
        TransitionOutcome::InvalidState => Err(AppError::Core(CoreError::Validation(
            "Only pending sessions can be rescheduled".into(),
        ))),
    }
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/sessions/{session_id}/start
///
/// Move a confirmed session into `in_progress`, re-running the overlap check
/// against sessions created after this one.
pub async fn start_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;
    ensure_transition(&current, session::STATUS_IN_PROGRESS)?;

    match SessionRepo::start(&state.pool, session_id).await? {
        TransitionOutcome::Applied(updated) => Ok(Json(DataResponse { data: updated })),
        TransitionOutcome::Overlap => Err(AppError::Core(CoreError::Conflict(
            "Cannot start this session. Another active session conflicts.".into(),
        ))),
        TransitionOutcome::InvalidState => Err(AppError::Core(CoreError::Validation(
            "Session is no longer in a startable state".into(),
        ))),
    }
}

/// POST /api/v1/sessions/{session_id}/complete
///
/// Complete an in-progress session. This is the only path that consumes
/// entitlement credit: one credit per linked student, atomically with the
/// status change. A second completion attempt fails as a terminal-state
/// conflict.
pub async fn complete_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;
    ensure_transition(&current, session::STATUS_COMPLETED)?;

    match SessionRepo::complete(&state.pool, session_id).await? {
        TransitionOutcome::Applied(updated) => {
            tracing::info!(session_id, tutor_id = tutor.id, "Session completed");
            Ok(Json(DataResponse { data: updated }))
        }
        TransitionOutcome::InvalidState => Err(AppError::Core(CoreError::Validation(
            "Only in-progress sessions can be completed".into(),
        ))),
        // Completion never runs the overlap check.
        TransitionOutcome::Overlap => {
            Err(AppError::InternalError("Unexpected overlap on completion".into()))
        }
    }
}

/// POST /api/v1/sessions/{session_id}/cancel
///
/// Cancel a session that has not started. Cancellation never touches
/// entitlement balances.
pub async fn cancel_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;
    ensure_transition(&current, session::STATUS_CANCELLED)?;

    let updated = SessionRepo::cancel(&state.pool, session_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Session changed state before it could be cancelled".into(),
            ))
        })?;

    Ok(Json(DataResponse { data: updated }))
}

/// POST /api/v1/sessions/{session_id}/revert
///
/// Revert to pending: clears the meeting link, resets every student
/// response, and drops any outstanding proposal.
pub async fn revert_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;
    if state_machine::is_terminal(&current.status) {
        return Err(AppError::Core(CoreError::TerminalState(format!(
            "Cannot revert a {} session",
            current.status
        ))));
    }
    if current.status == session::STATUS_IN_PROGRESS {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot revert a session in progress".into(),
        )));
    }

    let updated = SessionRepo::revert_to_pending(&state.pool, session_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Session changed state before it could be reverted".into(),
            ))
        })?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/sessions/{session_id}
///
/// Physically delete a session. Only the owning tutor may delete, and only
/// while the session is pending or confirmed.
pub async fn delete_session(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(session_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let tutor = require_tutor(&state.pool, &auth).await?;
    let current = ensure_session_exists(&state, session_id).await?;
    ensure_owner(&tutor, &current)?;

    if !state_machine::can_delete(&current.status) {
        return Err(AppError::Core(CoreError::TerminalState(
            "Cannot delete completed or in-progress sessions".into(),
        )));
    }

    if !SessionRepo::delete(&state.pool, session_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "Session changed state before it could be deleted".into(),
        )));
    }

    tracing::info!(session_id, tutor_id = tutor.id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Shared guards
// ---------------------------------------------------------------------------

async fn ensure_session_exists(state: &AppState, session_id: DbId) -> Result<Session, AppError> {
    SessionRepo::find_by_id(&state.pool, session_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Session",
                id: session_id,
            })
        })
}

async fn ensure_member(
    state: &AppState,
    session_id: DbId,
    student_id: DbId,
) -> Result<tutorlane_db::models::session::SessionStudent, AppError> {
    SessionRepo::session_student(&state.pool, session_id, student_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "Student not part of this session".into(),
            ))
        })
}

fn ensure_owner(
    tutor: &tutorlane_db::models::tutor::TutorProfile,
    session: &Session,
) -> Result<(), AppError> {
    if session.tutor_id != tutor.id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this session".into(),
        )));
    }
    Ok(())
}

/// Either party may act on the schedule: the owning tutor or a member student.
async fn ensure_participant(
    state: &AppState,
    auth: &AuthUser,
    session: &Session,
) -> Result<(), AppError> {
    if let Some(tutor) = TutorRepo::find_by_user(&state.pool, auth.user_id).await? {
        if tutor.id == session.tutor_id {
            return Ok(());
        }
    }
    if let Some(student) = StudentRepo::find_by_user(&state.pool, auth.user_id).await? {
        if SessionRepo::session_student(&state.pool, session.id, student.id)
            .await?
            .is_some()
        {
            return Ok(());
        }
    }
    Err(AppError::Core(CoreError::Forbidden(
        "You are not a participant of this session".into(),
    )))
}

/// A confirmed session's date/time is frozen; terminal sessions reject all
/// schedule changes.
fn ensure_schedule_mutable(session: &Session) -> Result<(), AppError> {
    if session.status == session::STATUS_CONFIRMED {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot change date/time of a confirmed session".into(),
        )));
    }
    if state_machine::is_terminal(&session.status)
        || session.status == session::STATUS_IN_PROGRESS
    {
        return Err(AppError::Core(CoreError::TerminalState(format!(
            "Cannot change the schedule of a {} session",
            session.status
        ))));
    }
    Ok(())
}

/// Validate a status transition, mapping terminal-source failures to the
/// terminal-state error class.
fn ensure_transition(session: &Session, target: &str) -> Result<(), AppError> {
    match state_machine::validate_transition(&session.status, target) {
        Ok(()) => Ok(()),
        Err(_) if state_machine::is_terminal(&session.status) => {
            Err(AppError::Core(CoreError::TerminalState(format!(
                "Session is already {}",
                session.status
            ))))
        }
        Err(msg) => Err(AppError::Core(CoreError::Validation(msg))),
    }
}

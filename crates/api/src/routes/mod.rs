pub mod entitlements;
pub mod health;
pub mod hires;
pub mod sessions;
pub mod tutors;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /sessions                                      create, list (tutor)
/// /sessions/{id}                                 get, delete
/// /sessions/{id}/respond                         per-student response
/// /sessions/{id}/rate                            per-student rating
/// /sessions/{id}/propose                         propose alternate time
/// /sessions/{id}/proposal/respond                accept/reject proposal
/// /sessions/{id}/schedule                        reschedule (pending only)
/// /sessions/{id}/start|complete|cancel|revert    status transitions
///
/// /hires                                         request (student), list (tutor)
/// /hires/{id}/respond                            tutor decision
///
/// /entitlements                                  list (student)
/// /entitlements/{id}/renew                       renewal request
/// /payments/entitlements/{id}/activate           gateway success callback
/// /payments/entitlements/{id}/fail               gateway failure callback
/// /payments/entitlements/{id}/expire             gateway expiry callback
///
/// /tutors/{id}                                   profile
/// /tutors/{id}/level-terms                       published terms
/// /tutors/{id}/reviews                           submit, list
/// /tutors/{id}/availability[...]                 calendar, slots, check
/// /tutors/{id}/entitlement-status                pair standing (student)
/// /tutors/me/...                                 owner-only mutations
///
/// /students/me/sessions                          list (student)
/// /students/me/hires                             list (student)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/sessions", sessions::router())
        .nest("/hires", hires::router())
        .nest("/entitlements", entitlements::router())
        .nest("/payments", entitlements::gateway_router())
        .nest("/tutors", tutors::router())
        .nest("/students/me", students_me_router())
}

/// Routes scoped to the authenticated student.
fn students_me_router() -> Router<AppState> {
    Router::new()
        .merge(sessions::student_router())
        .merge(hires::student_router())
}

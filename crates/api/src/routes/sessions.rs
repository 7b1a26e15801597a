//! Route definitions for the session lifecycle.
//!
//! ```text
//! POST   /                          create_session
//! GET    /                          list_tutor_sessions
//! GET    /{session_id}              get_session
//! DELETE /{session_id}              delete_session
//! POST   /{session_id}/respond      respond
//! POST   /{session_id}/rate         rate_session
//! POST   /{session_id}/propose      propose_time
//! POST   /{session_id}/proposal/respond  respond_to_proposal
//! PATCH  /{session_id}/schedule     reschedule
//! POST   /{session_id}/start        start_session
//! POST   /{session_id}/complete     complete_session
//! POST   /{session_id}/cancel       cancel_session
//! POST   /{session_id}/revert       revert_session
//! ```

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(sessions::create_session).get(sessions::list_tutor_sessions),
        )
        .route(
            "/{session_id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route("/{session_id}/respond", post(sessions::respond))
        .route("/{session_id}/rate", post(sessions::rate_session))
        .route("/{session_id}/propose", post(sessions::propose_time))
        .route(
            "/{session_id}/proposal/respond",
            post(sessions::respond_to_proposal),
        )
        .route("/{session_id}/schedule", patch(sessions::reschedule))
        .route("/{session_id}/start", post(sessions::start_session))
        .route("/{session_id}/complete", post(sessions::complete_session))
        .route("/{session_id}/cancel", post(sessions::cancel_session))
        .route("/{session_id}/revert", post(sessions::revert_session))
}

/// Student-scoped session listing, merged under `/students/me`.
pub fn student_router() -> Router<AppState> {
    Router::new().route("/sessions", get(sessions::list_student_sessions))
}

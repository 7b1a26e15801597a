//! Route definitions for the hire/authorization gate.
//!
//! ```text
//! POST   /                    request_hire (student)
//! GET    /                    list_tutor_hires (tutor)
//! POST   /{hire_id}/respond   respond_to_hire (tutor)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::hires;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(hires::request_hire).get(hires::list_tutor_hires))
        .route("/{hire_id}/respond", post(hires::respond_to_hire))
}

/// Student-scoped hire listing, merged under `/students/me`.
pub fn student_router() -> Router<AppState> {
    Router::new().route("/hires", get(hires::list_student_hires))
}

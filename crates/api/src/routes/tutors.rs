//! Route definitions for tutor profiles, terms, availability, and reviews.
//!
//! ```text
//! GET    /{tutor_id}                              get_tutor
//! GET    /{tutor_id}/level-terms                  list_level_terms
//! GET    /{tutor_id}/reviews                      list_reviews
//! POST   /{tutor_id}/reviews                      submit_review
//! GET    /{tutor_id}/availability                 get_availability
//! GET    /{tutor_id}/availability/slots           get_slots
//! GET    /{tutor_id}/availability/check           check_availability
//! GET    /{tutor_id}/entitlement-status           pair_status (student)
//!
//! GET    /me/stats                                get_stats
//! PUT    /me/level-terms                          upsert_level_terms
//! DELETE /me/level-terms/{level_id}               remove_level_terms
//! PUT    /me/availability                         update_availability
//! POST   /me/availability/blackouts               add_blackout
//! PATCH  /me/availability/blackouts/{blackout_id} update_blackout
//! DELETE /me/availability/blackouts/{blackout_id} remove_blackout
//! ```

use axum::routing::{get, patch, post, put};
use axum::Router;

use crate::handlers::{availability, entitlements, reviews, tutors};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Owner-scoped routes first; the static `me` segment takes priority
        // over `{tutor_id}`.
        .route("/me/stats", get(tutors::get_stats))
        .route("/me/level-terms", put(tutors::upsert_level_terms))
        .route(
            "/me/level-terms/{level_id}",
            axum::routing::delete(tutors::remove_level_terms),
        )
        .route("/me/availability", put(availability::update_availability))
        .route(
            "/me/availability/blackouts",
            post(availability::add_blackout),
        )
        .route(
            "/me/availability/blackouts/{blackout_id}",
            patch(availability::update_blackout).delete(availability::remove_blackout),
        )
        // Public / cross-role tutor routes.
        .route("/{tutor_id}", get(tutors::get_tutor))
        .route("/{tutor_id}/level-terms", get(tutors::list_level_terms))
        .route(
            "/{tutor_id}/reviews",
            get(reviews::list_reviews).post(reviews::submit_review),
        )
        .route("/{tutor_id}/availability", get(availability::get_availability))
        .route(
            "/{tutor_id}/availability/slots",
            get(availability::get_slots),
        )
        .route(
            "/{tutor_id}/availability/check",
            get(availability::check_availability),
        )
        .route(
            "/{tutor_id}/entitlement-status",
            get(entitlements::pair_status),
        )
}

//! Route definitions for the entitlement ledger and gateway callbacks.
//!
//! ```text
//! GET    /                                  list_my_entitlements (student)
//! POST   /{entitlement_id}/renew            renew_entitlement (student)
//!
//! POST   /entitlements/{id}/activate        activate (gateway)
//! POST   /entitlements/{id}/fail            mark_failed (gateway)
//! POST   /entitlements/{id}/expire          mark_expired (gateway)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entitlements;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(entitlements::list_my_entitlements))
        .route(
            "/{entitlement_id}/renew",
            post(entitlements::renew_entitlement),
        )
}

/// The payment gateway's callback surface, merged under `/payments`.
pub fn gateway_router() -> Router<AppState> {
    Router::new()
        .route(
            "/entitlements/{entitlement_id}/activate",
            post(entitlements::activate),
        )
        .route(
            "/entitlements/{entitlement_id}/fail",
            post(entitlements::mark_failed),
        )
        .route(
            "/entitlements/{entitlement_id}/expire",
            post(entitlements::mark_expired),
        )
}

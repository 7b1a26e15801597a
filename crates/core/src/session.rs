//! Tutoring-session status constants, state machine, and scheduling math.
//!
//! This module lives in `core` (zero internal deps) so it can be used by both
//! the API/repository layer and any future worker or CLI tooling. A session's
//! overall status is a deterministic function of the per-student responses
//! (see [`recompute_status`]) except once a tutor has explicitly moved it to
//! `in_progress` or `completed`.

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Session is awaiting student responses.
pub const STATUS_PENDING: &str = "pending";

/// At least one student confirmed attendance.
pub const STATUS_CONFIRMED: &str = "confirmed";

/// The tutor started the session.
pub const STATUS_IN_PROGRESS: &str = "in_progress";

/// The session took place; entitlement credits have been consumed.
pub const STATUS_COMPLETED: &str = "completed";

/// The session was cancelled (every student declined, or the tutor cancelled).
pub const STATUS_CANCELLED: &str = "cancelled";

/// All valid session status values.
pub const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_IN_PROGRESS,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

/// Statuses that participate in overlap-conflict detection. A session in any
/// of these states blocks the tutor's calendar for its interval.
pub const ACTIVE_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_CONFIRMED, STATUS_IN_PROGRESS];

/// Per-student response values.
pub const RESPONSE_PENDING: &str = "pending";
pub const RESPONSE_CONFIRMED: &str = "confirmed";
pub const RESPONSE_DECLINED: &str = "declined";

/// All valid per-student response values.
pub const VALID_RESPONSES: &[&str] = &[RESPONSE_PENDING, RESPONSE_CONFIRMED, RESPONSE_DECLINED];

/// Proposed-time decision values.
pub const PROPOSAL_PENDING: &str = "pending";
pub const PROPOSAL_ACCEPTED: &str = "accepted";
pub const PROPOSAL_REJECTED: &str = "rejected";

// ---------------------------------------------------------------------------
// Duration / earnings
// ---------------------------------------------------------------------------

/// Minimum session length (15 minutes).
pub const MIN_DURATION_HOURS: f64 = 0.25;

/// Maximum session length (8 hours).
pub const MAX_DURATION_HOURS: f64 = 8.0;

/// Validate that a session duration is within the allowed bounds.
pub fn validate_duration(duration_hours: f64) -> Result<(), String> {
    if !duration_hours.is_finite()
        || duration_hours < MIN_DURATION_HOURS
        || duration_hours > MAX_DURATION_HOURS
    {
        return Err(format!(
            "Session duration must be between {MIN_DURATION_HOURS} and {MAX_DURATION_HOURS} hours"
        ));
    }
    Ok(())
}

/// Validate that a per-student response value is one of the accepted values.
pub fn validate_response(response: &str) -> Result<(), String> {
    if VALID_RESPONSES.contains(&response) {
        Ok(())
    } else {
        Err(format!(
            "Invalid response '{response}'. Must be one of: {}",
            VALID_RESPONSES.join(", ")
        ))
    }
}

/// End instant of a session starting at `starts_at` with the given duration.
pub fn session_end(starts_at: Timestamp, duration_hours: f64) -> Timestamp {
    starts_at + chrono::Duration::milliseconds((duration_hours * 3_600_000.0).round() as i64)
}

/// Earnings snapshot taken at creation time: `rate x duration`, rounded to
/// two decimal places. Never recomputed when the tutor's rate later changes.
pub fn total_earnings(hourly_rate: f64, duration_hours: f64) -> f64 {
    (hourly_rate * duration_hours * 100.0).round() / 100.0
}

/// Half-open interval overlap test: `[a_start, a_end)` intersects
/// `[b_start, b_end)`. Back-to-back sessions (one ending exactly when the
/// next starts) do not conflict.
pub fn overlaps(a_start: Timestamp, a_end: Timestamp, b_start: Timestamp, b_end: Timestamp) -> bool {
    a_start < b_end && a_end > b_start
}

// ---------------------------------------------------------------------------
// Overall-status recomputation
// ---------------------------------------------------------------------------

/// Deterministically derive the overall session status from the per-student
/// responses:
///
/// - any student `confirmed` -> `confirmed`
/// - every student `declined` -> `cancelled`
/// - otherwise -> `pending`
///
/// Callers must not apply the result to sessions already in `in_progress` or
/// `completed`; those states are reached only by explicit tutor action.
pub fn recompute_status(responses: &[&str]) -> &'static str {
    let any_confirmed = responses.iter().any(|r| *r == RESPONSE_CONFIRMED);
    let all_declined =
        !responses.is_empty() && responses.iter().all(|r| *r == RESPONSE_DECLINED);

    if any_confirmed {
        STATUS_CONFIRMED
    } else if all_declined {
        STATUS_CANCELLED
    } else {
        STATUS_PENDING
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

pub mod state_machine {
    use super::{
        STATUS_CANCELLED, STATUS_COMPLETED, STATUS_CONFIRMED, STATUS_IN_PROGRESS, STATUS_PENDING,
    };

    /// Returns the set of valid target statuses reachable from `from`.
    ///
    /// Terminal states (`completed`, `cancelled`) return an empty slice.
    /// `confirmed -> pending` is the explicit tutor revert that re-opens
    /// negotiation; `in_progress` is reachable only from `confirmed`.
    pub fn valid_transitions(from: &str) -> &'static [&'static str] {
        match from {
            STATUS_PENDING => &[STATUS_CONFIRMED, STATUS_CANCELLED],
            STATUS_CONFIRMED => &[STATUS_IN_PROGRESS, STATUS_PENDING, STATUS_CANCELLED],
            STATUS_IN_PROGRESS => &[STATUS_COMPLETED],
            _ => &[],
        }
    }

    /// Check whether a transition from `from` to `to` is valid.
    pub fn can_transition(from: &str, to: &str) -> bool {
        valid_transitions(from).contains(&to)
    }

    /// Validate a state transition, returning an error message for invalid ones.
    pub fn validate_transition(from: &str, to: &str) -> Result<(), String> {
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(format!("Invalid session transition: {from} -> {to}"))
        }
    }

    /// Whether a session in `status` may be physically deleted by its tutor.
    /// Sessions that are running or already held are kept forever.
    pub fn can_delete(status: &str) -> bool {
        status == STATUS_PENDING || status == STATUS_CONFIRMED
    }

    /// Whether `status` is terminal (no outgoing transitions).
    pub fn is_terminal(status: &str) -> bool {
        status == STATUS_COMPLETED || status == STATUS_CANCELLED
    }
}

//! Entitlement status constants and the authorization predicate.
//!
//! An entitlement is a purchased, time- and count-limited right for one
//! student to receive sessions from one tutor for one subject/level tuple.
//! The predicate here is pure; the matching `expired` write
//! (`EntitlementRepo::reconcile_expiry`) lives in the db crate so the read
//! path and the state transition stay separately testable.

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status constants
// ---------------------------------------------------------------------------

/// Awaiting payment confirmation from the gateway.
pub const PAYMENT_PENDING: &str = "pending";

/// Payment confirmed; the entitlement can authorize sessions.
pub const PAYMENT_PAID: &str = "paid";

/// The gateway reported a failed charge.
pub const PAYMENT_FAILED: &str = "failed";

/// The purchase was cancelled before payment.
pub const PAYMENT_CANCELLED: &str = "cancelled";

/// All valid payment status values.
pub const VALID_PAYMENT_STATUSES: &[&str] =
    &[PAYMENT_PENDING, PAYMENT_PAID, PAYMENT_FAILED, PAYMENT_CANCELLED];

/// Validity window not yet opened (payment outstanding).
pub const VALIDITY_PENDING: &str = "pending";

/// Inside the 30-day validity window.
pub const VALIDITY_ACTIVE: &str = "active";

/// Past the validity window, or deactivated by a gateway expiry signal.
pub const VALIDITY_EXPIRED: &str = "expired";

/// All valid validity status values.
pub const VALID_VALIDITY_STATUSES: &[&str] =
    &[VALIDITY_PENDING, VALIDITY_ACTIVE, VALIDITY_EXPIRED];

/// Payment modes.
pub const PAYMENT_TYPE_MONTHLY: &str = "monthly";
pub const PAYMENT_TYPE_HOURLY: &str = "hourly";

/// Fixed policy: every activation opens a 30-day validity window.
pub const VALIDITY_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// The validity window opened by an activation at `now`.
pub fn validity_window(now: Timestamp) -> (Timestamp, Timestamp) {
    (now, now + chrono::Duration::days(VALIDITY_DAYS))
}

/// Whether the calendar window has lapsed. An unset end (payment never
/// confirmed) counts as expired for authorization purposes.
pub fn is_expired(validity_end: Option<Timestamp>, now: Timestamp) -> bool {
    match validity_end {
        Some(end) => end <= now,
        None => true,
    }
}

/// Why an entitlement does not authorize session creation right now.
///
/// Checked in order; the first failing condition is reported so the caller
/// can route the student appropriately (pay, renew, or top up).
pub fn check_authorization(
    payment_status: &str,
    validity_status: &str,
    validity_end: Option<Timestamp>,
    sessions_remaining: i32,
    now: Timestamp,
) -> Result<(), &'static str> {
    if payment_status != PAYMENT_PAID {
        return Err("payment_not_confirmed");
    }
    if validity_status != VALIDITY_ACTIVE {
        return Err("validity_not_active");
    }
    if is_expired(validity_end, now) {
        return Err("validity_window_lapsed");
    }
    if sessions_remaining <= 0 {
        return Err("no_sessions_remaining");
    }
    Ok(())
}

/// Pure form of the authorization invariant: an entitlement authorizes
/// session creation iff payment is `paid`, validity is `active`, the window
/// has not lapsed, and credits remain.
pub fn is_authorizing(
    payment_status: &str,
    validity_status: &str,
    validity_end: Option<Timestamp>,
    sessions_remaining: i32,
    now: Timestamp,
) -> bool {
    check_authorization(
        payment_status,
        validity_status,
        validity_end,
        sessions_remaining,
        now,
    )
    .is_ok()
}

/// Renewal is only legal against an expired source entitlement.
pub fn validate_renewable(validity_status: &str) -> Result<(), String> {
    if validity_status == VALIDITY_EXPIRED {
        Ok(())
    } else {
        Err(format!(
            "Only expired entitlements can be renewed (validity status is '{validity_status}')"
        ))
    }
}

/// Status as presented to students: the raw payment status until paid, then
/// `active`/`expired` depending on the window.
pub fn effective_status<'a>(
    payment_status: &'a str,
    validity_end: Option<Timestamp>,
    now: Timestamp,
) -> &'a str {
    if payment_status != PAYMENT_PAID {
        payment_status
    } else if is_expired(validity_end, now) {
        VALIDITY_EXPIRED
    } else {
        VALIDITY_ACTIVE
    }
}

/// Discounted monthly package price: `base x sessions x (100 - discount)%`,
/// rounded to two decimal places. Used when a tutor's level terms carry no
/// explicit monthly rate.
pub fn monthly_amount(base_rate: f64, discount_percent: f64, sessions_per_period: i32) -> f64 {
    let gross = base_rate * sessions_per_period as f64;
    (gross * (100.0 - discount_percent) / 100.0 * 100.0).round() / 100.0
}

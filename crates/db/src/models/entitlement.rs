//! Entitlement rows and the per-student authorization breakdown.

use serde::Serialize;
use sqlx::FromRow;
use tutorlane_core::entitlement;
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `entitlements` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Entitlement {
    pub id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub payment_type: String,
    pub base_rate: f64,
    pub discount_percent: f64,
    pub monthly_amount: Option<f64>,
    pub sessions_per_period: i32,
    pub sessions_remaining: i32,
    pub validity_start: Option<Timestamp>,
    pub validity_end: Option<Timestamp>,
    pub payment_status: String,
    pub validity_status: String,
    pub paid_at: Option<Timestamp>,
    pub request_notes: String,
    pub currency: String,
    pub renews_entitlement_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Entitlement {
    /// Whether this entitlement currently authorizes session creation.
    pub fn is_authorizing(&self, now: Timestamp) -> bool {
        entitlement::is_authorizing(
            &self.payment_status,
            &self.validity_status,
            self.validity_end,
            self.sessions_remaining,
            now,
        )
    }

    /// Whether the validity window has lapsed but the row still says `active`,
    /// meaning the lazy-expiry reconciliation write is due.
    pub fn needs_expiry_reconcile(&self, now: Timestamp) -> bool {
        self.validity_status == entitlement::VALIDITY_ACTIVE
            && entitlement::is_expired(self.validity_end, now)
    }
}

/// Input for issuing a fresh entitlement (hire acceptance or renewal).
#[derive(Debug, Clone)]
pub struct IssueEntitlement {
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub payment_type: String,
    pub base_rate: f64,
    pub discount_percent: f64,
    pub monthly_amount: Option<f64>,
    pub sessions_per_period: i32,
    pub request_notes: String,
    pub currency: String,
    pub renews_entitlement_id: Option<DbId>,
}

/// One student's entry in the session-creation authorization breakdown.
///
/// Returned to the caller when creation is rejected so students without a
/// usable entitlement can be routed to payment.
#[derive(Debug, Clone, Serialize)]
pub struct StudentAuthorization {
    pub student_id: DbId,
    pub authorized: bool,
    /// Why authorization failed (`payment_not_confirmed`, `expired`, ...);
    /// `None` when authorized.
    pub reason: Option<String>,
    pub entitlement_id: Option<DbId>,
    pub sessions_remaining: Option<i32>,
    pub validity_end: Option<Timestamp>,
}

impl StudentAuthorization {
    /// Breakdown entry for a student with no candidate entitlement at all.
    pub fn missing(student_id: DbId) -> Self {
        Self {
            student_id,
            authorized: false,
            reason: Some("no_entitlement".to_string()),
            entitlement_id: None,
            sessions_remaining: None,
            validity_end: None,
        }
    }

    /// Breakdown entry for a student judged against `entitlement`.
    pub fn from_entitlement(entitlement: &Entitlement, now: Timestamp) -> Self {
        let verdict = entitlement::check_authorization(
            &entitlement.payment_status,
            &entitlement.validity_status,
            entitlement.validity_end,
            entitlement.sessions_remaining,
            now,
        );
        Self {
            student_id: entitlement.student_id,
            authorized: verdict.is_ok(),
            reason: verdict.err().map(str::to_string),
            entitlement_id: Some(entitlement.id),
            sessions_remaining: Some(entitlement.sessions_remaining),
            validity_end: entitlement.validity_end,
        }
    }
}

//! Repository for the `entitlements` table.
//!
//! Activation, consumption, and expiry reconciliation are all single
//! conditional statements so concurrent gateway callbacks and session
//! completions cannot race an entitlement below zero or double-activate it.

use sqlx::PgPool;
use tutorlane_core::entitlement;
use tutorlane_core::types::{DbId, Timestamp};

use crate::models::entitlement::{Entitlement, IssueEntitlement};

const COLUMNS: &str = "\
    id, student_id, tutor_id, subject_id, level_id, payment_type, base_rate, \
    discount_percent, monthly_amount, sessions_per_period, sessions_remaining, \
    validity_start, validity_end, payment_status, validity_status, paid_at, \
    request_notes, currency, renews_entitlement_id, created_at, updated_at";

/// CRUD and lifecycle operations for the `entitlements` table.
pub struct EntitlementRepo;

impl EntitlementRepo {
    /// Find an entitlement by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM entitlements WHERE id = $1");
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent paid + active entitlement for a
    /// (student, tutor, subject, level) tuple, if any.
    pub async fn find_latest_paid_active(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
        subject_id: DbId,
        level_id: DbId,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entitlements \
             WHERE student_id = $1 AND tutor_id = $2 AND subject_id = $3 AND level_id = $4 \
               AND payment_status = $5 AND validity_status = $6 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .bind(subject_id)
            .bind(level_id)
            .bind(entitlement::PAYMENT_PAID)
            .bind(entitlement::VALIDITY_ACTIVE)
            .fetch_optional(pool)
            .await
    }

    /// The most recent paid + active entitlement between a student and a
    /// tutor, across all subjects/levels. Used by the review gate.
    pub async fn find_latest_paid_active_for_pair(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entitlements \
             WHERE student_id = $1 AND tutor_id = $2 \
               AND payment_status = $3 AND validity_status = $4 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .bind(entitlement::PAYMENT_PAID)
            .bind(entitlement::VALIDITY_ACTIVE)
            .fetch_optional(pool)
            .await
    }

    /// The most recent entitlement for a tuple, any status. Used to surface
    /// a diagnostic (pending payment, expired, ...) when no active one exists.
    pub async fn find_latest_for_tuple(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
        subject_id: DbId,
        level_id: DbId,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entitlements \
             WHERE student_id = $1 AND tutor_id = $2 AND subject_id = $3 AND level_id = $4 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .bind(subject_id)
            .bind(level_id)
            .fetch_optional(pool)
            .await
    }

    /// Issue a fresh entitlement (pending payment, window unset).
    pub async fn issue(
        pool: &PgPool,
        input: &IssueEntitlement,
    ) -> Result<Entitlement, sqlx::Error> {
        let query = format!(
            "INSERT INTO entitlements \
                (student_id, tutor_id, subject_id, level_id, payment_type, base_rate, \
                 discount_percent, monthly_amount, sessions_per_period, request_notes, \
                 currency, renews_entitlement_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(input.student_id)
            .bind(input.tutor_id)
            .bind(input.subject_id)
            .bind(input.level_id)
            .bind(&input.payment_type)
            .bind(input.base_rate)
            .bind(input.discount_percent)
            .bind(input.monthly_amount)
            .bind(input.sessions_per_period)
            .bind(&input.request_notes)
            .bind(&input.currency)
            .bind(input.renews_entitlement_id)
            .fetch_one(pool)
            .await
    }

    /// Activate on confirmed payment: payment `paid`, validity `active`, a
    /// fresh 30-day window, and the full session grant.
    ///
    /// The guard on `payment_status` makes re-activation a no-row update, so
    /// a duplicate gateway callback returns `None` instead of resetting the
    /// window.
    pub async fn activate(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let (start, end) = entitlement::validity_window(now);
        let query = format!(
            "UPDATE entitlements \
             SET payment_status = $2, validity_status = $3, validity_start = $4, \
                 validity_end = $5, sessions_remaining = sessions_per_period, paid_at = $6 \
             WHERE id = $1 AND payment_status <> $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(id)
            .bind(entitlement::PAYMENT_PAID)
            .bind(entitlement::VALIDITY_ACTIVE)
            .bind(start)
            .bind(end)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Gateway failure callback: payment `failed`.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!(
            "UPDATE entitlements SET payment_status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(id)
            .bind(entitlement::PAYMENT_FAILED)
            .fetch_optional(pool)
            .await
    }

    /// Gateway checkout-expiry callback: validity `expired`.
    pub async fn mark_expired(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Entitlement>, sqlx::Error> {
        let query = format!(
            "UPDATE entitlements SET validity_status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(id)
            .bind(entitlement::VALIDITY_EXPIRED)
            .fetch_optional(pool)
            .await
    }

    /// Idempotent write half of lazy expiry: flip `active` to `expired` once
    /// the window has lapsed. Safe to call from any read path; a no-op when
    /// the row is already expired or still inside its window.
    pub async fn reconcile_expiry(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entitlements \
             SET validity_status = $2 \
             WHERE id = $1 AND validity_status = $3 AND validity_end <= $4",
        )
        .bind(id)
        .bind(entitlement::VALIDITY_EXPIRED)
        .bind(entitlement::VALIDITY_ACTIVE)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clone an expired entitlement's commercial terms into a fresh
    /// pending/pending record linked back to the source.
    pub async fn renew(pool: &PgPool, source: &Entitlement) -> Result<Entitlement, sqlx::Error> {
        let input = IssueEntitlement {
            student_id: source.student_id,
            tutor_id: source.tutor_id,
            subject_id: source.subject_id,
            level_id: source.level_id,
            payment_type: source.payment_type.clone(),
            base_rate: source.base_rate,
            discount_percent: source.discount_percent,
            monthly_amount: source.monthly_amount,
            sessions_per_period: source.sessions_per_period,
            request_notes: format!("Renewal of entitlement {}", source.id),
            currency: source.currency.clone(),
            renews_entitlement_id: Some(source.id),
        };
        Self::issue(pool, &input).await
    }

    /// Consume one session credit. Atomic conditional decrement with a floor
    /// at zero: consuming an exhausted entitlement is a no-op, not an error.
    pub async fn consume(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE entitlements \
             SET sessions_remaining = sessions_remaining - 1 \
             WHERE id = $1 AND sessions_remaining > 0",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List a student's entitlements, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<Entitlement>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM entitlements \
             WHERE student_id = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Entitlement>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }
}

//! Repository for the availability calendar tables.
//!
//! A tutor's calendar is three tables: the profile row (booking rules and
//! the accepting flag), seven weekday window rows, and zero or more blackout
//! ranges. Reads bootstrap missing calendars with defaults so every tutor
//! always has one.

use sqlx::{PgPool, Postgres, Transaction};
use tutorlane_core::types::{DbId, Timestamp};

use crate::models::availability::{
    AvailabilityCalendar, AvailabilityProfile, AvailabilityWindow, Blackout, CreateBlackout,
    UpdateAvailability, UpdateBlackout, WindowInput,
};

const PROFILE_COLUMNS: &str = "\
    id, tutor_id, min_notice_hours, max_advance_days, session_durations, \
    accepting_bookings, created_at, updated_at";

const WINDOW_COLUMNS: &str = "profile_id, weekday, start_time, end_time, enabled";

const BLACKOUT_COLUMNS: &str = "\
    id, profile_id, starts_at, ends_at, reason, is_active, created_at, updated_at";

/// CRUD for `availability_profiles`, `availability_windows`, and
/// `availability_blackouts`.
pub struct AvailabilityRepo;

impl AvailabilityRepo {
    /// Fetch a tutor's calendar, creating a default one on first read.
    pub async fn find_or_create(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<AvailabilityCalendar, sqlx::Error> {
        let query = format!(
            "SELECT {PROFILE_COLUMNS} FROM availability_profiles WHERE tutor_id = $1"
        );
        let existing = sqlx::query_as::<_, AvailabilityProfile>(&query)
            .bind(tutor_id)
            .fetch_optional(pool)
            .await?;

        let profile = match existing {
            Some(profile) => profile,
            None => Self::create_default(pool, tutor_id).await?,
        };

        let windows = Self::windows(pool, profile.id).await?;
        let blackouts = Self::blackouts(pool, profile.id).await?;
        Ok(AvailabilityCalendar {
            profile,
            windows,
            blackouts,
        })
    }

    /// Insert a default profile plus its seven weekday windows
    /// (Mon-Fri 09:00-17:00 enabled, weekend disabled).
    async fn create_default(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<AvailabilityProfile, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO availability_profiles (tutor_id) VALUES ($1) \
             RETURNING {PROFILE_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, AvailabilityProfile>(&query)
            .bind(tutor_id)
            .fetch_one(&mut *tx)
            .await?;

        for weekday in 0i16..7 {
            sqlx::query(
                "INSERT INTO availability_windows (profile_id, weekday, enabled) \
                 VALUES ($1, $2, $3)",
            )
            .bind(profile.id)
            .bind(weekday)
            .bind(weekday < 5)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(profile)
    }

    /// The seven weekday window rows, Monday first.
    pub async fn windows(
        pool: &PgPool,
        profile_id: DbId,
    ) -> Result<Vec<AvailabilityWindow>, sqlx::Error> {
        let query = format!(
            "SELECT {WINDOW_COLUMNS} FROM availability_windows \
             WHERE profile_id = $1 ORDER BY weekday"
        );
        sqlx::query_as::<_, AvailabilityWindow>(&query)
            .bind(profile_id)
            .fetch_all(pool)
            .await
    }

    /// All blackout ranges for a profile, oldest first.
    pub async fn blackouts(pool: &PgPool, profile_id: DbId) -> Result<Vec<Blackout>, sqlx::Error> {
        let query = format!(
            "SELECT {BLACKOUT_COLUMNS} FROM availability_blackouts \
             WHERE profile_id = $1 ORDER BY starts_at"
        );
        sqlx::query_as::<_, Blackout>(&query)
            .bind(profile_id)
            .fetch_all(pool)
            .await
    }

    /// Apply a general-availability update. Only provided fields change;
    /// window rows are upserted per weekday inside one transaction.
    pub async fn update(
        pool: &PgPool,
        profile_id: DbId,
        input: &UpdateAvailability,
    ) -> Result<AvailabilityProfile, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE availability_profiles SET \
                min_notice_hours = COALESCE($2, min_notice_hours), \
                max_advance_days = COALESCE($3, max_advance_days), \
                session_durations = COALESCE($4, session_durations), \
                accepting_bookings = COALESCE($5, accepting_bookings) \
             WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, AvailabilityProfile>(&query)
            .bind(profile_id)
            .bind(input.min_notice_hours)
            .bind(input.max_advance_days)
            .bind(&input.session_durations)
            .bind(input.accepting_bookings)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(windows) = &input.windows {
            for window in windows {
                Self::upsert_window(&mut tx, profile_id, window).await?;
            }
        }

        tx.commit().await?;
        Ok(profile)
    }

    async fn upsert_window(
        tx: &mut Transaction<'_, Postgres>,
        profile_id: DbId,
        window: &WindowInput,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO availability_windows (profile_id, weekday, start_time, end_time, enabled) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (profile_id, weekday) \
             DO UPDATE SET start_time = $3, end_time = $4, enabled = $5",
        )
        .bind(profile_id)
        .bind(window.weekday)
        .bind(window.start_time)
        .bind(window.end_time)
        .bind(window.enabled)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Add a blackout range.
    pub async fn add_blackout(
        pool: &PgPool,
        profile_id: DbId,
        input: &CreateBlackout,
    ) -> Result<Blackout, sqlx::Error> {
        let query = format!(
            "INSERT INTO availability_blackouts (profile_id, starts_at, ends_at, reason) \
             VALUES ($1, $2, $3, COALESCE($4, '')) \
             RETURNING {BLACKOUT_COLUMNS}"
        );
        sqlx::query_as::<_, Blackout>(&query)
            .bind(profile_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.reason)
            .fetch_one(pool)
            .await
    }

    /// Edit a blackout range. Returns `None` when it does not belong to the
    /// profile or does not exist.
    pub async fn update_blackout(
        pool: &PgPool,
        profile_id: DbId,
        blackout_id: DbId,
        input: &UpdateBlackout,
    ) -> Result<Option<Blackout>, sqlx::Error> {
        let query = format!(
            "UPDATE availability_blackouts SET \
                starts_at = COALESCE($3, starts_at), \
                ends_at = COALESCE($4, ends_at), \
                reason = COALESCE($5, reason), \
                is_active = COALESCE($6, is_active) \
             WHERE id = $2 AND profile_id = $1 \
             RETURNING {BLACKOUT_COLUMNS}"
        );
        sqlx::query_as::<_, Blackout>(&query)
            .bind(profile_id)
            .bind(blackout_id)
            .bind(input.starts_at)
            .bind(input.ends_at)
            .bind(&input.reason)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Remove a blackout range. Returns whether a row was deleted.
    pub async fn remove_blackout(
        pool: &PgPool,
        profile_id: DbId,
        blackout_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM availability_blackouts WHERE id = $2 AND profile_id = $1",
        )
        .bind(profile_id)
        .bind(blackout_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Advisory availability check for a start instant, using the stored
    /// calendar. Falls back to defaults when the tutor has no calendar yet.
    pub async fn is_available(
        pool: &PgPool,
        tutor_id: DbId,
        instant: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let calendar = Self::find_or_create(pool, tutor_id).await?;
        Ok(tutorlane_core::availability::is_available(
            &calendar.to_config(),
            instant,
        ))
    }
}

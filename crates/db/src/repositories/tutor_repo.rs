//! Repository for the `tutor_profiles` and `tutor_level_terms` tables.

use sqlx::PgPool;
use tutorlane_core::types::DbId;

use crate::models::tutor::{LevelTerms, TutorProfile, TutorStats, UpsertLevelTerms};

const PROFILE_COLUMNS: &str = "\
    id, user_id, bio, average_rating, total_sessions, created_at, updated_at";

const TERMS_COLUMNS: &str = "\
    id, tutor_id, level_id, hourly_rate, discount_percent, sessions_per_month, \
    monthly_rate, created_at, updated_at";

/// CRUD for tutor profiles and their per-level commercial terms.
pub struct TutorRepo;

impl TutorRepo {
    /// Find a tutor profile by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TutorProfile>, sqlx::Error> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM tutor_profiles WHERE id = $1");
        sqlx::query_as::<_, TutorProfile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a tutor profile by the owning user's ID.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<TutorProfile>, sqlx::Error> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM tutor_profiles WHERE user_id = $1");
        sqlx::query_as::<_, TutorProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a tutor profile.
    pub async fn create(pool: &PgPool, user_id: DbId, bio: &str) -> Result<TutorProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO tutor_profiles (user_id, bio) VALUES ($1, $2) \
             RETURNING {PROFILE_COLUMNS}"
        );
        sqlx::query_as::<_, TutorProfile>(&query)
            .bind(user_id)
            .bind(bio)
            .fetch_one(pool)
            .await
    }

    /// The tutor's published terms for one academic level, if configured.
    pub async fn level_terms(
        pool: &PgPool,
        tutor_id: DbId,
        level_id: DbId,
    ) -> Result<Option<LevelTerms>, sqlx::Error> {
        let query = format!(
            "SELECT {TERMS_COLUMNS} FROM tutor_level_terms \
             WHERE tutor_id = $1 AND level_id = $2"
        );
        sqlx::query_as::<_, LevelTerms>(&query)
            .bind(tutor_id)
            .bind(level_id)
            .fetch_optional(pool)
            .await
    }

    /// List all level terms configured by a tutor.
    pub async fn list_level_terms(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<Vec<LevelTerms>, sqlx::Error> {
        let query = format!(
            "SELECT {TERMS_COLUMNS} FROM tutor_level_terms \
             WHERE tutor_id = $1 ORDER BY level_id"
        );
        sqlx::query_as::<_, LevelTerms>(&query)
            .bind(tutor_id)
            .fetch_all(pool)
            .await
    }

    /// Set or replace the tutor's terms for one level.
    pub async fn upsert_level_terms(
        pool: &PgPool,
        tutor_id: DbId,
        input: &UpsertLevelTerms,
    ) -> Result<LevelTerms, sqlx::Error> {
        let query = format!(
            "INSERT INTO tutor_level_terms \
                (tutor_id, level_id, hourly_rate, discount_percent, sessions_per_month, monthly_rate) \
             VALUES ($1, $2, $3, COALESCE($4, 0), $5, $6) \
             ON CONFLICT (tutor_id, level_id) \
             DO UPDATE SET hourly_rate = $3, discount_percent = COALESCE($4, 0), \
                           sessions_per_month = $5, monthly_rate = $6 \
             RETURNING {TERMS_COLUMNS}"
        );
        sqlx::query_as::<_, LevelTerms>(&query)
            .bind(tutor_id)
            .bind(input.level_id)
            .bind(input.hourly_rate)
            .bind(input.discount_percent)
            .bind(input.sessions_per_month)
            .bind(input.monthly_rate)
            .fetch_one(pool)
            .await
    }

    /// Remove the tutor's terms for one level. Returns whether a row existed.
    pub async fn remove_level_terms(
        pool: &PgPool,
        tutor_id: DbId,
        level_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM tutor_level_terms WHERE tutor_id = $1 AND level_id = $2")
                .bind(tutor_id)
                .bind(level_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Publish a new review-based average rating on the profile.
    pub async fn set_average_rating(
        pool: &PgPool,
        tutor_id: DbId,
        average_rating: f64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tutor_profiles SET average_rating = $2 WHERE id = $1")
            .bind(tutor_id)
            .bind(average_rating)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Publish the rated-session count on the profile.
    pub async fn set_total_sessions(
        pool: &PgPool,
        tutor_id: DbId,
        total_sessions: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE tutor_profiles SET total_sessions = $2 WHERE id = $1")
            .bind(tutor_id)
            .bind(total_sessions)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Earnings summary over the tutor's completed sessions.
    pub async fn stats(pool: &PgPool, tutor_id: DbId) -> Result<TutorStats, sqlx::Error> {
        sqlx::query_as::<_, TutorStats>(
            "SELECT COUNT(*) AS completed_sessions, \
                    COALESCE(SUM(duration_hours), 0)::DOUBLE PRECISION AS total_hours, \
                    COALESCE(SUM(total_earnings), 0)::DOUBLE PRECISION AS total_earnings \
             FROM sessions \
             WHERE tutor_id = $1 AND status = 'completed'",
        )
        .bind(tutor_id)
        .fetch_one(pool)
        .await
    }
}

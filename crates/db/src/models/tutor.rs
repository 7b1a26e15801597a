//! Tutor profile and per-level commercial terms.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `tutor_profiles` table.
///
/// `average_rating` is the review-based published figure maintained by the
/// rating aggregator; `total_sessions` counts the tutor's rated
/// completed/in-progress sessions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub bio: String,
    pub average_rating: f64,
    pub total_sessions: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `tutor_level_terms` table: the tutor's published rate,
/// discount, and monthly session allowance for one academic level.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LevelTerms {
    pub id: DbId,
    pub tutor_id: DbId,
    pub level_id: DbId,
    pub hourly_rate: f64,
    pub discount_percent: f64,
    pub sessions_per_month: i32,
    pub monthly_rate: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for setting a tutor's terms for one level.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertLevelTerms {
    pub level_id: DbId,
    pub hourly_rate: f64,
    pub discount_percent: Option<f64>,
    pub sessions_per_month: i32,
    pub monthly_rate: Option<f64>,
}

/// Earnings/statistics summary over a tutor's completed sessions.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TutorStats {
    pub completed_sessions: i64,
    pub total_hours: f64,
    pub total_earnings: f64,
}

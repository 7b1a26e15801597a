//! Availability calendar rows and their conversion to the pure config type.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::availability::{AvailabilityConfig, BlackoutRange, DayWindow};
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `availability_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailabilityProfile {
    pub id: DbId,
    pub tutor_id: DbId,
    pub min_notice_hours: i32,
    pub max_advance_days: i32,
    pub session_durations: Vec<i32>,
    pub accepting_bookings: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `availability_windows` table (one weekday's window).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AvailabilityWindow {
    pub profile_id: DbId,
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub enabled: bool,
}

/// A row from the `availability_blackouts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Blackout {
    pub id: DbId,
    pub profile_id: DbId,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub reason: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The full calendar returned to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityCalendar {
    pub profile: AvailabilityProfile,
    pub windows: Vec<AvailabilityWindow>,
    pub blackouts: Vec<Blackout>,
}

impl AvailabilityCalendar {
    /// Assemble the pure config consumed by `tutorlane_core::availability`.
    pub fn to_config(&self) -> AvailabilityConfig {
        let mut config = AvailabilityConfig {
            accepting_bookings: self.profile.accepting_bookings,
            session_durations: self.profile.session_durations.clone(),
            min_notice_hours: self.profile.min_notice_hours,
            max_advance_days: self.profile.max_advance_days,
            blackouts: self
                .blackouts
                .iter()
                .map(|b| BlackoutRange {
                    starts_at: b.starts_at,
                    ends_at: b.ends_at,
                    is_active: b.is_active,
                })
                .collect(),
            ..AvailabilityConfig::default()
        };
        for window in &self.windows {
            let idx = window.weekday as usize;
            if idx < 7 {
                config.windows[idx] = DayWindow {
                    start: window.start_time,
                    end: window.end_time,
                    enabled: window.enabled,
                };
            }
        }
        config
    }
}

/// One weekday's window in an update request.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowInput {
    /// 0 = Monday .. 6 = Sunday.
    pub weekday: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub enabled: bool,
}

/// Request body for updating general availability settings. Only provided
/// fields are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAvailability {
    pub windows: Option<Vec<WindowInput>>,
    pub min_notice_hours: Option<i32>,
    pub max_advance_days: Option<i32>,
    pub session_durations: Option<Vec<i32>>,
    pub accepting_bookings: Option<bool>,
}

/// Request body for adding a blackout range.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlackout {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub reason: Option<String>,
}

/// Request body for editing a blackout range.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBlackout {
    pub starts_at: Option<Timestamp>,
    pub ends_at: Option<Timestamp>,
    pub reason: Option<String>,
    pub is_active: Option<bool>,
}

//! Tutor availability: weekly windows, blackout ranges, and slot enumeration.
//!
//! Everything here is a pure function of an [`AvailabilityConfig`] and an
//! instant/date, so the same logic backs the advisory `is-available` check
//! and the slot listing endpoint. Availability is guidance for students and
//! tutors; the session scheduler's conflict check against existing sessions
//! is the authoritative gate.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Defaults and bounds
// ---------------------------------------------------------------------------

/// Candidate slots are stepped at this granularity.
pub const SLOT_STEP_MINUTES: i64 = 30;

/// Longest offerable session duration (8 hours).
pub const MAX_DURATION_MINUTES: i32 = 480;

/// Default booking notice (hours).
pub const DEFAULT_MIN_NOTICE_HOURS: i32 = 2;

/// Default maximum advance booking horizon (days).
pub const DEFAULT_MAX_ADVANCE_DAYS: i32 = 30;

/// Default offered session durations (minutes).
pub const DEFAULT_SESSION_DURATIONS: &[i32] = &[30, 60, 90, 120];

/// One weekday's bookable window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub enabled: bool,
}

impl DayWindow {
    /// 09:00-17:00, enabled or not.
    fn default_hours(enabled: bool) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            enabled,
        }
    }
}

/// An absolute date range during which the tutor is unavailable, overriding
/// the weekly windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlackoutRange {
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub is_active: bool,
}

/// A tutor's full availability configuration.
///
/// `windows` is indexed by `Weekday::num_days_from_monday()` (0 = Monday).
#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    pub accepting_bookings: bool,
    pub windows: [DayWindow; 7],
    pub blackouts: Vec<BlackoutRange>,
    pub session_durations: Vec<i32>,
    pub min_notice_hours: i32,
    pub max_advance_days: i32,
}

impl Default for AvailabilityConfig {
    /// Weekdays 09:00-17:00, weekends off, accepting bookings.
    fn default() -> Self {
        let weekday = DayWindow::default_hours(true);
        let weekend = DayWindow::default_hours(false);
        Self {
            accepting_bookings: true,
            windows: [
                weekday, weekday, weekday, weekday, weekday, weekend, weekend,
            ],
            blackouts: Vec::new(),
            session_durations: DEFAULT_SESSION_DURATIONS.to_vec(),
            min_notice_hours: DEFAULT_MIN_NOTICE_HOURS,
            max_advance_days: DEFAULT_MAX_ADVANCE_DAYS,
        }
    }
}

/// A bookable candidate slot produced by [`enumerate_slots`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: Timestamp,
    pub end: Timestamp,
    pub duration_minutes: i32,
}

/// Validate an offered-durations list: non-empty, each within (0, 8h].
pub fn validate_durations(durations: &[i32]) -> Result<(), String> {
    if durations.is_empty() {
        return Err("At least one session duration must be offered".to_string());
    }
    if let Some(bad) = durations
        .iter()
        .find(|d| **d <= 0 || **d > MAX_DURATION_MINUTES)
    {
        return Err(format!(
            "Session duration {bad} is out of range (1..={MAX_DURATION_MINUTES} minutes)"
        ));
    }
    Ok(())
}

/// Validate a blackout range.
pub fn validate_blackout(starts_at: Timestamp, ends_at: Timestamp) -> Result<(), String> {
    if ends_at <= starts_at {
        return Err("Blackout end must be after its start".to_string());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Whether `instant` falls in an active blackout range (inclusive bounds).
pub fn in_blackout(config: &AvailabilityConfig, instant: Timestamp) -> bool {
    config
        .blackouts
        .iter()
        .any(|b| b.is_active && instant >= b.starts_at && instant <= b.ends_at)
}

/// Advisory availability check for a candidate start instant:
/// accepting bookings, inside the enabled weekday window for that
/// time-of-day, and not inside any active blackout.
pub fn is_available(config: &AvailabilityConfig, instant: Timestamp) -> bool {
    if !config.accepting_bookings {
        return false;
    }
    if in_blackout(config, instant) {
        return false;
    }

    let window = config.windows[instant.weekday().num_days_from_monday() as usize];
    if !window.enabled {
        return false;
    }

    let time = instant.time();
    time >= window.start && time <= window.end
}

/// All candidate slots on `date`: for each offered duration, starts stepped
/// at [`SLOT_STEP_MINUTES`] inside the day's window, kept when the slot fits
/// before the window closes and the start passes [`is_available`].
///
/// Pure function of the stored config and the date: finite and restartable.
pub fn enumerate_slots(config: &AvailabilityConfig, date: NaiveDate) -> Vec<Slot> {
    let window = config.windows[date.weekday().num_days_from_monday() as usize];
    if !window.enabled {
        return Vec::new();
    }

    let window_start = window.start.num_seconds_from_midnight() as i64 / 60;
    let window_end = window.end.num_seconds_from_midnight() as i64 / 60;

    let mut slots = Vec::new();
    for &duration in &config.session_durations {
        let mut cursor = window_start;
        while cursor < window_end {
            let slot_end = cursor + duration as i64;
            if slot_end <= window_end {
                let start = date
                    .and_time(minute_of_day(cursor))
                    .and_utc();
                if is_available(config, start) {
                    slots.push(Slot {
                        start,
                        end: date.and_time(minute_of_day(slot_end)).and_utc(),
                        duration_minutes: duration,
                    });
                }
            }
            cursor += SLOT_STEP_MINUTES;
        }
    }
    slots
}

fn minute_of_day(minutes: i64) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(minutes as u32 * 60, 0).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    // 2025-03-10 is a Monday.
    fn monday(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn saturday(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 15, h, m, 0).unwrap()
    }

    #[test]
    fn weekday_inside_window_is_available() {
        let config = AvailabilityConfig::default();
        assert!(is_available(&config, monday(10, 0)));
    }

    #[test]
    fn weekday_outside_window_is_unavailable() {
        let config = AvailabilityConfig::default();
        assert!(!is_available(&config, monday(8, 59)));
        assert!(!is_available(&config, monday(17, 1)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let config = AvailabilityConfig::default();
        assert!(is_available(&config, monday(9, 0)));
        assert!(is_available(&config, monday(17, 0)));
    }

    #[test]
    fn weekend_disabled_by_default() {
        let config = AvailabilityConfig::default();
        assert!(!is_available(&config, saturday(10, 0)));
    }

    #[test]
    fn kill_switch_blocks_everything() {
        let config = AvailabilityConfig {
            accepting_bookings: false,
            ..Default::default()
        };
        assert!(!is_available(&config, monday(10, 0)));
    }

    #[test]
    fn active_blackout_blocks_instant() {
        let config = AvailabilityConfig {
            blackouts: vec![BlackoutRange {
                starts_at: monday(0, 0),
                ends_at: monday(23, 59),
                is_active: true,
            }],
            ..Default::default()
        };
        assert!(!is_available(&config, monday(10, 0)));
    }

    #[test]
    fn inactive_blackout_is_ignored() {
        let config = AvailabilityConfig {
            blackouts: vec![BlackoutRange {
                starts_at: monday(0, 0),
                ends_at: monday(23, 59),
                is_active: false,
            }],
            ..Default::default()
        };
        assert!(is_available(&config, monday(10, 0)));
    }

    #[test]
    fn blackout_outside_instant_is_ignored() {
        let config = AvailabilityConfig {
            blackouts: vec![BlackoutRange {
                starts_at: monday(12, 0),
                ends_at: monday(14, 0),
                is_active: true,
            }],
            ..Default::default()
        };
        assert!(is_available(&config, monday(10, 0)));
        assert!(!is_available(&config, monday(13, 0)));
    }

    #[test]
    fn slots_step_at_half_hours() {
        let config = AvailabilityConfig {
            session_durations: vec![60],
            ..Default::default()
        };
        let slots = enumerate_slots(&config, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        // 09:00..16:00 starts inclusive, hourly slots stepped at 30 min: 15 slots.
        assert_eq!(slots.len(), 15);
        assert_eq!(slots[0].start, monday(9, 0));
        assert_eq!(slots[0].end, monday(10, 0));
        assert_eq!(slots[1].start, monday(9, 30));
        assert_eq!(slots.last().unwrap().end, monday(17, 0));
    }

    #[test]
    fn slot_must_fit_inside_window() {
        let config = AvailabilityConfig {
            session_durations: vec![480],
            ..Default::default()
        };
        // 8h slot in an 8h window: only the 09:00 start fits.
        let slots = enumerate_slots(&config, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start, monday(9, 0));
    }

    #[test]
    fn disabled_day_yields_no_slots() {
        let config = AvailabilityConfig::default();
        let slots = enumerate_slots(&config, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
        assert!(slots.is_empty());
    }

    #[test]
    fn blackout_filters_slots() {
        let config = AvailabilityConfig {
            session_durations: vec![60],
            blackouts: vec![BlackoutRange {
                starts_at: monday(9, 0),
                ends_at: monday(12, 0),
                is_active: true,
            }],
            ..Default::default()
        };
        let slots = enumerate_slots(&config, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        // Starts at or before 12:00 are blacked out (inclusive bounds).
        assert!(slots.iter().all(|s| s.start > monday(12, 0)));
        assert!(!slots.is_empty());
    }

    #[test]
    fn multiple_durations_each_enumerated() {
        let config = AvailabilityConfig {
            session_durations: vec![30, 60],
            ..Default::default()
        };
        let slots = enumerate_slots(&config, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert!(slots.iter().any(|s| s.duration_minutes == 30));
        assert!(slots.iter().any(|s| s.duration_minutes == 60));
    }

    #[test]
    fn duration_validation() {
        assert!(validate_durations(&[30, 60]).is_ok());
        assert!(validate_durations(&[]).is_err());
        assert!(validate_durations(&[0]).is_err());
        assert!(validate_durations(&[481]).is_err());
        assert!(validate_durations(&[480]).is_ok());
    }

    #[test]
    fn blackout_validation() {
        assert!(validate_blackout(monday(9, 0), monday(10, 0)).is_ok());
        assert!(validate_blackout(monday(10, 0), monday(9, 0)).is_err());
        assert!(validate_blackout(monday(9, 0), monday(9, 0)).is_err());
    }
}

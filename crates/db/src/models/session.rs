//! Tutoring-session rows, per-student sub-records, and read models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Session {
    pub id: DbId,
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub starts_at: Timestamp,
    pub duration_hours: f64,
    pub hourly_rate: f64,
    /// Snapshot taken at creation; never recomputed on rate changes.
    pub total_earnings: f64,
    pub status: String,
    pub notes: String,
    /// Mean of per-student ratings, one decimal place.
    pub rating: Option<f64>,
    pub meeting_link: Option<String>,
    pub meeting_link_sent_at: Option<Timestamp>,
    pub proposed_start: Option<Timestamp>,
    pub proposed_status: Option<String>,
    pub proposed_decided_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Session {
    /// End instant of this session's scheduled interval.
    pub fn ends_at(&self) -> Timestamp {
        tutorlane_core::session::session_end(self.starts_at, self.duration_hours)
    }
}

/// A row from the `session_students` table: one participant's entitlement
/// link, response, and rating.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionStudent {
    pub session_id: DbId,
    pub student_id: DbId,
    pub entitlement_id: DbId,
    pub response_status: String,
    pub responded_at: Option<Timestamp>,
    pub response_note: String,
    pub rating: Option<i16>,
    pub feedback: String,
    pub rated_at: Option<Timestamp>,
}

/// A participant row enriched with the student's display name for read
/// models (assembled by an explicit join, not nested population).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SessionStudentDetail {
    pub session_id: DbId,
    pub student_id: DbId,
    pub entitlement_id: DbId,
    pub response_status: String,
    pub responded_at: Option<Timestamp>,
    pub response_note: String,
    pub rating: Option<i16>,
    pub feedback: String,
    pub rated_at: Option<Timestamp>,
    pub student_name: String,
}

/// A session together with its participant rows.
#[derive(Debug, Clone, Serialize)]
pub struct SessionWithStudents {
    #[serde(flatten)]
    pub session: Session,
    pub students: Vec<SessionStudentDetail>,
}

/// A participant to link at session creation.
#[derive(Debug, Clone)]
pub struct NewSessionStudent {
    pub student_id: DbId,
    pub entitlement_id: DbId,
}

/// Fully-resolved input for inserting a session (all preconditions already
/// checked by the caller except the overlap conflict, which the repository
/// enforces inside the insert transaction).
#[derive(Debug, Clone)]
pub struct NewSession {
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub starts_at: Timestamp,
    pub duration_hours: f64,
    pub hourly_rate: f64,
    pub total_earnings: f64,
    pub notes: String,
    pub meeting_link: String,
    pub students: Vec<NewSessionStudent>,
}

/// Outcome of a conflict-checked session write.
///
/// `Overlap` means another active session for the same tutor intersects the
/// requested interval and nothing was written.
#[derive(Debug)]
pub enum ScheduleOutcome {
    Scheduled(Session),
    Overlap,
}

/// Filters for session list queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionFilter {
    pub status: Option<String>,
    pub start_date: Option<Timestamp>,
    pub end_date: Option<Timestamp>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

impl SessionFilter {
    /// Page size (default 10, capped at 100).
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10).clamp(1, 100)
    }

    /// Row offset derived from the 1-based page number.
    pub fn offset(&self) -> i64 {
        (self.page.unwrap_or(1).max(1) - 1) * self.limit()
    }
}

/// A page of sessions plus the total row count.
#[derive(Debug, Serialize)]
pub struct SessionPage {
    pub sessions: Vec<SessionWithStudents>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

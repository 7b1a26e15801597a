//! Hire records: the student-initiated, tutor-approved relationship gate.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `hire_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HireRecord {
    pub id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub status: String,
    pub hired_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request body for a student's hire request.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestHire {
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
}

/// Request body for the tutor's decision on a hire request.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondToHire {
    /// `"accept"` or `"reject"`.
    pub action: String,
}

/// A hire record joined with the requesting student's display name.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HireWithStudent {
    pub id: DbId,
    pub student_id: DbId,
    pub tutor_id: DbId,
    pub subject_id: DbId,
    pub level_id: DbId,
    pub status: String,
    pub hired_at: Timestamp,
    pub student_name: String,
}

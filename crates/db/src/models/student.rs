//! Student and parent profile rows.

use serde::Serialize;
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// A row from the `student_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StudentProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub level_id: Option<DbId>,
    pub parent_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A row from the `parent_profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParentProfile {
    pub id: DbId,
    pub user_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

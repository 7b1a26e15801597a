//! User account rows (the auth collaborator's surface).

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tutorlane_core::types::{DbId, Timestamp};

/// Account is verified and may participate in sessions.
pub const ACCOUNT_ACTIVE: &str = "active";

/// Role names.
pub const ROLE_STUDENT: &str = "student";
pub const ROLE_TUTOR: &str = "tutor";
pub const ROLE_PARENT: &str = "parent";
pub const ROLE_ADMIN: &str = "admin";

/// A row from the `users` table.
///
/// `password_hash` is deliberately not serialized.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub account_status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub account_status: Option<String>,
}

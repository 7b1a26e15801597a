//! Repositories for the `student_profiles` and `parent_profiles` tables.

use sqlx::PgPool;
use tutorlane_core::types::DbId;

use crate::models::student::{ParentProfile, StudentProfile};

const STUDENT_COLUMNS: &str = "id, user_id, level_id, parent_id, created_at, updated_at";

/// CRUD for the `student_profiles` table.
pub struct StudentRepo;

impl StudentRepo {
    /// Find a student profile by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE id = $1");
        sqlx::query_as::<_, StudentProfile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a student profile by the owning user's ID.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<StudentProfile>, sqlx::Error> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM student_profiles WHERE user_id = $1");
        sqlx::query_as::<_, StudentProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch every profile whose ID is in `ids`, in input order.
    pub async fn find_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<StudentProfile>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDENT_COLUMNS} FROM student_profiles \
             WHERE id = ANY($1) \
             ORDER BY array_position($1, id)"
        );
        sqlx::query_as::<_, StudentProfile>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Create a student profile.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        level_id: Option<DbId>,
        parent_id: Option<DbId>,
    ) -> Result<StudentProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO student_profiles (user_id, level_id, parent_id) \
             VALUES ($1, $2, $3) \
             RETURNING {STUDENT_COLUMNS}"
        );
        sqlx::query_as::<_, StudentProfile>(&query)
            .bind(user_id)
            .bind(level_id)
            .bind(parent_id)
            .fetch_one(pool)
            .await
    }
}

const PARENT_COLUMNS: &str = "id, user_id, created_at, updated_at";

/// CRUD for the `parent_profiles` table.
pub struct ParentRepo;

impl ParentRepo {
    /// Find a parent profile by the owning user's ID.
    pub async fn find_by_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<ParentProfile>, sqlx::Error> {
        let query = format!("SELECT {PARENT_COLUMNS} FROM parent_profiles WHERE user_id = $1");
        sqlx::query_as::<_, ParentProfile>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Create a parent profile.
    pub async fn create(pool: &PgPool, user_id: DbId) -> Result<ParentProfile, sqlx::Error> {
        let query = format!(
            "INSERT INTO parent_profiles (user_id) VALUES ($1) RETURNING {PARENT_COLUMNS}"
        );
        sqlx::query_as::<_, ParentProfile>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// IDs of the parent's children (student profiles).
    pub async fn child_student_ids(
        pool: &PgPool,
        parent_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM student_profiles WHERE parent_id = $1")
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }
}

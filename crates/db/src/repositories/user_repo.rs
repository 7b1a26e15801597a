//! Repository for the `users` table.

use sqlx::PgPool;
use tutorlane_core::types::DbId;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "\
    id, full_name, email, password_hash, role, account_status, created_at, updated_at";

/// CRUD for the `users` table.
pub struct UserRepo;

impl UserRepo {
    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch every user whose ID is in `ids`.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = ANY($1)");
        sqlx::query_as::<_, User>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    /// Create a user account. `account_status` defaults to `pending`.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (full_name, email, password_hash, role, account_status) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 'pending')) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(&input.role)
            .bind(&input.account_status)
            .fetch_one(pool)
            .await
    }
}

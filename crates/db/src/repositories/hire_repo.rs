//! Repository for the `hire_records` table.

use sqlx::PgPool;
use tutorlane_core::hire;
use tutorlane_core::types::DbId;

use crate::models::hire::{HireRecord, HireWithStudent};

const COLUMNS: &str = "\
    id, student_id, tutor_id, subject_id, level_id, status, hired_at, created_at, updated_at";

/// CRUD for the `hire_records` table.
pub struct HireRepo;

impl HireRepo {
    /// Find a hire record by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<HireRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hire_records WHERE id = $1");
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The most recent record for a (student, tutor) pair, any status.
    pub async fn find_for_pair(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<HireRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hire_records \
             WHERE student_id = $1 AND tutor_id = $2 \
             ORDER BY hired_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .fetch_optional(pool)
            .await
    }

    /// The accepted record for a (student, tutor) pair, if any.
    pub async fn find_accepted(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
    ) -> Result<Option<HireRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hire_records \
             WHERE student_id = $1 AND tutor_id = $2 AND status = $3"
        );
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .bind(hire::STATUS_ACCEPTED)
            .fetch_optional(pool)
            .await
    }

    /// Create a fresh pending hire request.
    pub async fn create(
        pool: &PgPool,
        student_id: DbId,
        tutor_id: DbId,
        subject_id: DbId,
        level_id: DbId,
    ) -> Result<HireRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO hire_records (student_id, tutor_id, subject_id, level_id, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(student_id)
            .bind(tutor_id)
            .bind(subject_id)
            .bind(level_id)
            .bind(hire::STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    /// Resubmit a rejected record in place: back to pending, refreshed
    /// timestamp and subject/level, and any stale duplicate rows for the same
    /// pair purged in the same transaction.
    pub async fn resubmit(
        pool: &PgPool,
        record_id: DbId,
        subject_id: DbId,
        level_id: DbId,
    ) -> Result<Option<HireRecord>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE hire_records \
             SET status = $2, subject_id = $3, level_id = $4, hired_at = now() \
             WHERE id = $1 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, HireRecord>(&query)
            .bind(record_id)
            .bind(hire::STATUS_PENDING)
            .bind(subject_id)
            .bind(level_id)
            .bind(hire::STATUS_REJECTED)
            .fetch_optional(&mut *tx)
            .await?;

        if let Some(record) = &record {
            sqlx::query(
                "DELETE FROM hire_records \
                 WHERE student_id = $1 AND tutor_id = $2 AND id <> $3",
            )
            .bind(record.student_id)
            .bind(record.tutor_id)
            .bind(record.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(record)
    }

    /// Record the tutor's decision. Returns `None` if the record is gone.
    pub async fn set_status(
        pool: &PgPool,
        record_id: DbId,
        status: &str,
    ) -> Result<Option<HireRecord>, sqlx::Error> {
        let query = format!(
            "UPDATE hire_records SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(record_id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// List a tutor's hire requests, optionally filtered by status, enriched
    /// with the requesting student's name.
    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<HireWithStudent>, sqlx::Error> {
        let base = "SELECT h.id, h.student_id, h.tutor_id, h.subject_id, h.level_id, \
                    h.status, h.hired_at, u.full_name AS student_name \
                    FROM hire_records h \
                    JOIN student_profiles sp ON sp.id = h.student_id \
                    JOIN users u ON u.id = sp.user_id \
                    WHERE h.tutor_id = $1";
        let query = match status {
            Some(_) => format!("{base} AND h.status = $2 ORDER BY h.hired_at DESC"),
            None => format!("{base} ORDER BY h.hired_at DESC"),
        };
        let mut q = sqlx::query_as::<_, HireWithStudent>(&query).bind(tutor_id);
        if let Some(status) = status {
            q = q.bind(status);
        }
        q.fetch_all(pool).await
    }

    /// List a student's hire records, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<HireRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM hire_records \
             WHERE student_id = $1 \
             ORDER BY hired_at DESC"
        );
        sqlx::query_as::<_, HireRecord>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }

    /// Whether any of the given students has an accepted hire with the tutor.
    pub async fn any_accepted_for_students(
        pool: &PgPool,
        student_ids: &[DbId],
        tutor_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM hire_records \
                WHERE student_id = ANY($1) AND tutor_id = $2 AND status = $3)",
        )
        .bind(student_ids)
        .bind(tutor_id)
        .bind(hire::STATUS_ACCEPTED)
        .fetch_one(pool)
        .await
    }
}

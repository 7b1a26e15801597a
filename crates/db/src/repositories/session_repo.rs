//! Repository for the `sessions` and `session_students` tables.
//!
//! Every write that depends on the tutor's calendar being conflict-free
//! (creation, starting, accepting a proposed time, rescheduling) takes a
//! per-tutor advisory lock inside its transaction, so two concurrent
//! requests for overlapping intervals cannot both pass the check.

use sqlx::{PgPool, Postgres, Transaction};
use tutorlane_core::rating;
use tutorlane_core::session::{self, state_machine};
use tutorlane_core::types::{DbId, Timestamp};

use crate::models::session::{
    NewSession, ScheduleOutcome, Session, SessionFilter, SessionPage, SessionStudent,
    SessionStudentDetail, SessionWithStudents,
};

const COLUMNS: &str = "\
    id, tutor_id, subject_id, level_id, starts_at, duration_hours, hourly_rate, \
    total_earnings, status, notes, rating, meeting_link, meeting_link_sent_at, \
    proposed_start, proposed_status, proposed_decided_at, completed_at, \
    created_at, updated_at";

const STUDENT_DETAIL_COLUMNS: &str = "\
    ss.session_id, ss.student_id, ss.entitlement_id, ss.response_status, \
    ss.responded_at, ss.response_note, ss.rating, ss.feedback, ss.rated_at, \
    u.full_name AS student_name";

/// Outcome of a guarded status/schedule transition.
#[derive(Debug)]
pub enum TransitionOutcome {
    /// The transition was applied.
    Applied(Session),
    /// Another active session for the same tutor overlaps the interval.
    Overlap,
    /// The row was not in the expected source state (lost a race or the
    /// caller skipped a precondition).
    InvalidState,
}

/// CRUD and lifecycle operations for tutoring sessions.
pub struct SessionRepo;

impl SessionRepo {
    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Participant rows with student names, assembled by an explicit join.
    pub async fn students(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Vec<SessionStudentDetail>, sqlx::Error> {
        let query = format!(
            "SELECT {STUDENT_DETAIL_COLUMNS} \
             FROM session_students ss \
             JOIN student_profiles sp ON sp.id = ss.student_id \
             JOIN users u ON u.id = sp.user_id \
             WHERE ss.session_id = $1 \
             ORDER BY ss.student_id"
        );
        sqlx::query_as::<_, SessionStudentDetail>(&query)
            .bind(session_id)
            .fetch_all(pool)
            .await
    }

    /// One participant's row.
    pub async fn session_student(
        pool: &PgPool,
        session_id: DbId,
        student_id: DbId,
    ) -> Result<Option<SessionStudent>, sqlx::Error> {
        sqlx::query_as::<_, SessionStudent>(
            "SELECT session_id, student_id, entitlement_id, response_status, responded_at, \
                    response_note, rating, feedback, rated_at \
             FROM session_students \
             WHERE session_id = $1 AND student_id = $2",
        )
        .bind(session_id)
        .bind(student_id)
        .fetch_optional(pool)
        .await
    }

    /// A session plus its participant rows, or `None` if it does not exist.
    pub async fn find_with_students(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<SessionWithStudents>, sqlx::Error> {
        let session = Self::find_by_id(pool, id).await?;
        match session {
            Some(session) => {
                let students = Self::students(pool, session.id).await?;
                Ok(Some(SessionWithStudents { session, students }))
            }
            None => Ok(None),
        }
    }

    /// A page of a tutor's sessions, newest first, with participant rows.
    pub async fn list_for_tutor(
        pool: &PgPool,
        tutor_id: DbId,
        filter: &SessionFilter,
    ) -> Result<SessionPage, sqlx::Error> {
        let conditions = "tutor_id = $1 \
            AND ($2::TEXT IS NULL OR status = $2) \
            AND ($3::TIMESTAMPTZ IS NULL OR starts_at >= $3) \
            AND ($4::TIMESTAMPTZ IS NULL OR starts_at <= $4)";

        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE {conditions} \
             ORDER BY starts_at DESC LIMIT $5 OFFSET $6"
        );
        let sessions = sqlx::query_as::<_, Session>(&query)
            .bind(tutor_id)
            .bind(&filter.status)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(pool)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM sessions WHERE {conditions}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(tutor_id)
            .bind(&filter.status)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(pool)
            .await?;

        Self::assemble_page(pool, sessions, total, filter).await
    }

    /// A page of the sessions a student participates in, newest first.
    pub async fn list_for_student(
        pool: &PgPool,
        student_id: DbId,
        filter: &SessionFilter,
    ) -> Result<SessionPage, sqlx::Error> {
        let conditions = "id IN (SELECT session_id FROM session_students WHERE student_id = $1) \
            AND ($2::TEXT IS NULL OR status = $2) \
            AND ($3::TIMESTAMPTZ IS NULL OR starts_at >= $3) \
            AND ($4::TIMESTAMPTZ IS NULL OR starts_at <= $4)";

        let query = format!(
            "SELECT {COLUMNS} FROM sessions WHERE {conditions} \
             ORDER BY starts_at DESC LIMIT $5 OFFSET $6"
        );
        let sessions = sqlx::query_as::<_, Session>(&query)
            .bind(student_id)
            .bind(&filter.status)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .bind(filter.limit())
            .bind(filter.offset())
            .fetch_all(pool)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM sessions WHERE {conditions}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(student_id)
            .bind(&filter.status)
            .bind(filter.start_date)
            .bind(filter.end_date)
            .fetch_one(pool)
            .await?;

        Self::assemble_page(pool, sessions, total, filter).await
    }

    async fn assemble_page(
        pool: &PgPool,
        sessions: Vec<Session>,
        total: i64,
        filter: &SessionFilter,
    ) -> Result<SessionPage, sqlx::Error> {
        let mut enriched = Vec::with_capacity(sessions.len());
        for session in sessions {
            let students = Self::students(pool, session.id).await?;
            enriched.push(SessionWithStudents { session, students });
        }
        let limit = filter.limit();
        Ok(SessionPage {
            sessions: enriched,
            total,
            page: filter.page.unwrap_or(1).max(1),
            total_pages: (total + limit - 1) / limit,
        })
    }

    /// Lifetime count of the tutor's completed sessions (the figure checked
    /// against the per-level monthly cap).
    pub async fn count_completed(pool: &PgPool, tutor_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions WHERE tutor_id = $1 AND status = $2",
        )
        .bind(tutor_id)
        .bind(session::STATUS_COMPLETED)
        .fetch_one(pool)
        .await
    }

    /// Count and mean of the tutor's rated completed/in-progress sessions.
    pub async fn rated_session_stats(
        pool: &PgPool,
        tutor_id: DbId,
    ) -> Result<(i64, Option<f64>), sqlx::Error> {
        let row: (i64, Option<f64>) = sqlx::query_as(
            "SELECT COUNT(*), AVG(rating) FROM sessions \
             WHERE tutor_id = $1 AND status IN ($2, $3) AND rating IS NOT NULL",
        )
        .bind(tutor_id)
        .bind(session::STATUS_COMPLETED)
        .bind(session::STATUS_IN_PROGRESS)
        .fetch_one(pool)
        .await?;
        Ok((row.0, row.1.map(rating::round_one_decimal)))
    }

    // -----------------------------------------------------------------------
    // Conflict check
    // -----------------------------------------------------------------------

    /// Half-open overlap test against the tutor's active sessions, run
    /// inside the caller's (locked) transaction.
    async fn has_overlap(
        tx: &mut Transaction<'_, Postgres>,
        tutor_id: DbId,
        starts_at: Timestamp,
        ends_at: Timestamp,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM sessions \
                WHERE tutor_id = $1 \
                  AND status = ANY($2) \
                  AND ($5::BIGINT IS NULL OR id <> $5) \
                  AND starts_at < $4 \
                  AND starts_at + make_interval(secs => duration_hours * 3600) > $3)",
        )
        .bind(tutor_id)
        .bind(session::ACTIVE_STATUSES)
        .bind(starts_at)
        .bind(ends_at)
        .bind(exclude_id)
        .fetch_one(&mut **tx)
        .await
    }

    async fn lock_tutor_calendar(
        tx: &mut Transaction<'_, Postgres>,
        tutor_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(tutor_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Conflict-checked insert of a session and its participant rows.
    ///
    /// The caller has already verified accounts, hires, the level cap, and
    /// entitlement authorization; this method owns the overlap check and the
    /// write, serialized per tutor.
    pub async fn create(
        pool: &PgPool,
        input: &NewSession,
    ) -> Result<ScheduleOutcome, sqlx::Error> {
        let ends_at = session::session_end(input.starts_at, input.duration_hours);
        let mut tx = pool.begin().await?;
        Self::lock_tutor_calendar(&mut tx, input.tutor_id).await?;

        if Self::has_overlap(&mut tx, input.tutor_id, input.starts_at, ends_at, None).await? {
            return Ok(ScheduleOutcome::Overlap);
        }

        let query = format!(
            "INSERT INTO sessions \
                (tutor_id, subject_id, level_id, starts_at, duration_hours, hourly_rate, \
                 total_earnings, notes, meeting_link, meeting_link_sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now()) \
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(input.tutor_id)
            .bind(input.subject_id)
            .bind(input.level_id)
            .bind(input.starts_at)
            .bind(input.duration_hours)
            .bind(input.hourly_rate)
            .bind(input.total_earnings)
            .bind(&input.notes)
            .bind(&input.meeting_link)
            .fetch_one(&mut *tx)
            .await?;

        for student in &input.students {
            sqlx::query(
                "INSERT INTO session_students (session_id, student_id, entitlement_id) \
                 VALUES ($1, $2, $3)",
            )
            .bind(session.id)
            .bind(student.student_id)
            .bind(student.entitlement_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ScheduleOutcome::Scheduled(session))
    }

    /// Upsert one student's response and recompute the overall status.
    ///
    /// The recomputation overwrites whatever the previous status was, except
    /// that sessions already in `in_progress`/`completed` keep their status
    /// (those are reached only by explicit tutor action).
    pub async fn respond(
        pool: &PgPool,
        session_id: DbId,
        student_id: DbId,
        response_status: &str,
        note: Option<&str>,
    ) -> Result<Option<Session>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE session_students \
             SET response_status = $3, responded_at = now(), \
                 response_note = COALESCE($4, response_note) \
             WHERE session_id = $1 AND student_id = $2",
        )
        .bind(session_id)
        .bind(student_id)
        .bind(response_status)
        .bind(note)
        .execute(&mut *tx)
        .await?;

        let responses: Vec<String> = sqlx::query_scalar(
            "SELECT response_status FROM session_students WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        let new_status = if current.status == session::STATUS_IN_PROGRESS
            || current.status == session::STATUS_COMPLETED
        {
            current.status.clone()
        } else {
            let refs: Vec<&str> = responses.iter().map(String::as_str).collect();
            session::recompute_status(&refs).to_string()
        };

        let query = format!(
            "UPDATE sessions SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(&new_status)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Attach a proposed alternate start time. Only legal while the session
    /// is `pending`; returns `None` when the guard fails.
    pub async fn propose_time(
        pool: &PgPool,
        session_id: DbId,
        proposed_start: Timestamp,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions \
             SET proposed_start = $2, proposed_status = $3, proposed_decided_at = NULL \
             WHERE id = $1 AND status = $4 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(proposed_start)
            .bind(session::PROPOSAL_PENDING)
            .bind(session::STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Accept the outstanding proposal: atomically replace the start time,
    /// mark the proposal accepted, and confirm the session. The new interval
    /// is conflict-checked under the tutor lock.
    pub async fn accept_proposal(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(TransitionOutcome::InvalidState);
        };

        let Some(proposed_start) = current.proposed_start else {
            return Ok(TransitionOutcome::InvalidState);
        };
        if current.proposed_status.as_deref() != Some(session::PROPOSAL_PENDING)
            || current.status != session::STATUS_PENDING
        {
            return Ok(TransitionOutcome::InvalidState);
        }

        Self::lock_tutor_calendar(&mut tx, current.tutor_id).await?;
        let ends_at = session::session_end(proposed_start, current.duration_hours);
        if Self::has_overlap(
            &mut tx,
            current.tutor_id,
            proposed_start,
            ends_at,
            Some(session_id),
        )
        .await?
        {
            return Ok(TransitionOutcome::Overlap);
        }

        let query = format!(
            "UPDATE sessions \
             SET starts_at = $2, status = $3, proposed_start = NULL, \
                 proposed_status = $4, proposed_decided_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(proposed_start)
            .bind(session::STATUS_CONFIRMED)
            .bind(session::PROPOSAL_ACCEPTED)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// Reject the outstanding proposal without touching the schedule.
    /// Returns `None` when there is no pending proposal.
    pub async fn reject_proposal(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions \
             SET proposed_start = NULL, proposed_status = $2, proposed_decided_at = now() \
             WHERE id = $1 AND proposed_status = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(session::PROPOSAL_REJECTED)
            .bind(session::PROPOSAL_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Move a confirmed session into `in_progress`, re-running the overlap
    /// check first; a conflicting session may have been created after this
    /// one was scheduled.
    pub async fn start(pool: &PgPool, session_id: DbId) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(TransitionOutcome::InvalidState);
        };

        if state_machine::validate_transition(&current.status, session::STATUS_IN_PROGRESS)
            .is_err()
        {
            return Ok(TransitionOutcome::InvalidState);
        }

        Self::lock_tutor_calendar(&mut tx, current.tutor_id).await?;
        if Self::has_overlap(
            &mut tx,
            current.tutor_id,
            current.starts_at,
            current.ends_at(),
            Some(session_id),
        )
        .await?
        {
            return Ok(TransitionOutcome::Overlap);
        }

        let query = format!(
            "UPDATE sessions SET status = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(session::STATUS_IN_PROGRESS)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// Complete an in-progress session and consume one entitlement credit
    /// per linked student, all in one transaction. A consume on an exhausted
    /// entitlement is a no-op; a database failure rolls the completion back.
    ///
    /// This is the only path that decrements entitlement credit.
    pub async fn complete(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE sessions SET status = $2, completed_at = now() \
             WHERE id = $1 AND status = $3 \
             RETURNING {COLUMNS}"
        );
        let Some(updated) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(session::STATUS_COMPLETED)
            .bind(session::STATUS_IN_PROGRESS)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(TransitionOutcome::InvalidState);
        };

        let entitlement_ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT entitlement_id FROM session_students WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        for entitlement_id in entitlement_ids {
            let result = sqlx::query(
                "UPDATE entitlements \
                 SET sessions_remaining = sessions_remaining - 1 \
                 WHERE id = $1 AND sessions_remaining > 0",
            )
            .bind(entitlement_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                tracing::warn!(
                    session_id,
                    entitlement_id,
                    "Completed session against an exhausted entitlement"
                );
            }
        }

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// Cancel a session that has not started. Returns `None` when the
    /// session is past the point of cancellation.
    pub async fn cancel(pool: &PgPool, session_id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "UPDATE sessions SET status = $2 \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(session::STATUS_CANCELLED)
            .bind(&[session::STATUS_PENDING, session::STATUS_CONFIRMED][..])
            .fetch_optional(pool)
            .await
    }

    /// Revert to `pending`: clear the meeting link, reset every student
    /// response, and drop any outstanding proposal.
    pub async fn revert_to_pending(
        pool: &PgPool,
        session_id: DbId,
    ) -> Result<Option<Session>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE sessions \
             SET status = $2, meeting_link = NULL, meeting_link_sent_at = NULL, \
                 proposed_start = NULL, proposed_status = NULL, proposed_decided_at = NULL \
             WHERE id = $1 AND status = ANY($3) \
             RETURNING {COLUMNS}"
        );
        let Some(updated) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(session::STATUS_PENDING)
            .bind(&[session::STATUS_PENDING, session::STATUS_CONFIRMED][..])
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE session_students \
             SET response_status = $2, responded_at = NULL, response_note = '' \
             WHERE session_id = $1",
        )
        .bind(session_id)
        .bind(session::RESPONSE_PENDING)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    /// Move a pending session to a new start time, conflict-checked.
    pub async fn reschedule(
        pool: &PgPool,
        session_id: DbId,
        new_start: Timestamp,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(TransitionOutcome::InvalidState);
        };
        if current.status != session::STATUS_PENDING {
            return Ok(TransitionOutcome::InvalidState);
        }

        Self::lock_tutor_calendar(&mut tx, current.tutor_id).await?;
        let ends_at = session::session_end(new_start, current.duration_hours);
        if Self::has_overlap(&mut tx, current.tutor_id, new_start, ends_at, Some(session_id))
            .await?
        {
            return Ok(TransitionOutcome::Overlap);
        }

        let query = format!(
            "UPDATE sessions SET starts_at = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(new_start)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Applied(updated))
    }

    /// Physically delete a session that has not started. Returns whether a
    /// row was deleted.
    pub async fn delete(pool: &PgPool, session_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND status = ANY($2)")
            .bind(session_id)
            .bind(&[session::STATUS_PENDING, session::STATUS_CONFIRMED][..])
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Upsert one student's rating and recompute the session aggregate as
    /// the mean of all per-student ratings (one decimal place).
    pub async fn rate(
        pool: &PgPool,
        session_id: DbId,
        student_id: DbId,
        rating_value: i16,
        feedback: Option<&str>,
    ) -> Result<Option<Session>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE session_students \
             SET rating = $3, feedback = COALESCE($4, ''), rated_at = now() \
             WHERE session_id = $1 AND student_id = $2",
        )
        .bind(session_id)
        .bind(student_id)
        .bind(rating_value)
        .bind(feedback)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let ratings: Vec<i16> = sqlx::query_scalar(
            "SELECT rating FROM session_students \
             WHERE session_id = $1 AND rating IS NOT NULL",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE sessions SET rating = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Session>(&query)
            .bind(session_id)
            .bind(rating::mean_rating(&ratings))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }
}

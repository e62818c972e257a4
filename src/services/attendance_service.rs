// src/services/attendance_service.rs
//
// The attendance ledger (one session row per class/date/slot, get-or-create)
// and the entry recorder (at most one entry per session/student). Both lean
// on the declared UNIQUE constraints: the session upsert converges concurrent
// callers on one row, and an entry-insert constraint violation is translated
// into DuplicateEntry instead of surfacing as a database error.
use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{AttendanceEntry, AttendanceSession, CanceledSessionWithClass},
        user::User,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// How long a session QR payload stays valid, in seconds.
pub const QR_TOKEN_MAX_AGE_SECS: i64 = 7200;

// SQLite UNIQUE violation codes (19 = SQLITE_CONSTRAINT, plus the extended
// UNIQUE/PK variants).
fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map_or(false, |c| c == "19" || c == "2067" || c == "1555"),
        _ => false,
    }
}

// --- Session ledger ---

pub async fn find_session(db_pool: &SqlitePool, session_id: &str) -> AppResult<AttendanceSession> {
    sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, date, session_date, schedule_time, qr_code_data, canceled
        FROM attendance_sessions
        WHERE id = ?
        "#,
    )
    .bind(session_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::SessionNotFound)
}

/// Fetches the one session for (class, calendar date, schedule slot),
/// creating it when absent. `INSERT .. ON CONFLICT DO NOTHING` plus a
/// re-select keeps concurrent callers on a single row; the returned flag
/// says whether this call inserted it.
pub async fn get_or_create_session(
    db_pool: &SqlitePool,
    class_id: &str,
    session_date: NaiveDate,
    schedule_time: &str,
    now: DateTime<Utc>,
) -> AppResult<(AttendanceSession, bool)> {
    let date_str = session_date.format("%Y-%m-%d").to_string();
    let id = Uuid::new_v4().to_string();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance_sessions (id, class_id, date, session_date, schedule_time, canceled)
        VALUES (?, ?, ?, ?, ?, 0)
        ON CONFLICT (class_id, session_date, schedule_time) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(class_id)
    .bind(now.to_rfc3339())
    .bind(&date_str)
    .bind(schedule_time)
    .execute(db_pool)
    .await?;

    let was_created = result.rows_affected() == 1;
    if was_created {
        tracing::info!(
            "created attendance session for class {} on {} ({})",
            class_id,
            date_str,
            schedule_time
        );
    }

    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, date, session_date, schedule_time, qr_code_data, canceled
        FROM attendance_sessions
        WHERE class_id = ? AND session_date = ? AND schedule_time = ?
        "#,
    )
    .bind(class_id)
    .bind(&date_str)
    .bind(schedule_time)
    .fetch_one(db_pool)
    .await?;

    Ok((session, was_created))
}

/// Flips the canceled flag. Two calls restore the original state.
pub async fn toggle_cancellation(
    db_pool: &SqlitePool,
    session_id: &str,
) -> AppResult<AttendanceSession> {
    let result = sqlx::query("UPDATE attendance_sessions SET canceled = NOT canceled WHERE id = ?")
        .bind(session_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::SessionNotFound);
    }

    let session = find_session(db_pool, session_id).await?;
    tracing::info!(
        "session {} is now {}",
        session_id,
        if session.canceled { "canceled" } else { "active" }
    );
    Ok(session)
}

/// Overwrites the stored QR payload for a session.
pub async fn set_qr_payload(
    db_pool: &SqlitePool,
    session_id: &str,
    payload: &str,
) -> AppResult<()> {
    let result = sqlx::query("UPDATE attendance_sessions SET qr_code_data = ? WHERE id = ?")
        .bind(payload)
        .bind(session_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::SessionNotFound);
    }
    Ok(())
}

pub async fn list_sessions(db_pool: &SqlitePool, class_id: &str) -> AppResult<Vec<AttendanceSession>> {
    let sessions = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, date, session_date, schedule_time, qr_code_data, canceled
        FROM attendance_sessions
        WHERE class_id = ?
        ORDER BY date DESC
        "#,
    )
    .bind(class_id)
    .fetch_all(db_pool)
    .await?;
    Ok(sessions)
}

pub async fn count_sessions(db_pool: &SqlitePool, class_id: &str) -> AppResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM attendance_sessions WHERE class_id = ?")
            .bind(class_id)
            .fetch_one(db_pool)
            .await?;
    Ok(count)
}

/// Canceled sessions across all of a student's enrolled classes, for the
/// calendar view.
pub async fn list_canceled_for_student(
    db_pool: &SqlitePool,
    student_id: &str,
) -> AppResult<Vec<CanceledSessionWithClass>> {
    let rows = sqlx::query_as::<_, CanceledSessionWithClass>(
        r#"
        SELECT s.class_id, c.subject AS class_name, s.session_date, s.schedule_time
        FROM attendance_sessions s
        JOIN classes c ON c.id = s.class_id
        JOIN enrollments e ON e.class_id = s.class_id
        WHERE e.student_id = ? AND s.canceled = 1
        ORDER BY s.session_date ASC, s.schedule_time ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

// --- Entry recorder ---

async fn insert_entry(
    db_pool: &SqlitePool,
    session_id: &str,
    student_id: &str,
    display_name: &str,
) -> AppResult<()> {
    let result = sqlx::query(
        r#"
        INSERT INTO attendance_entries (id, session_id, student_id, time_scanned)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(session_id)
    .bind(student_id)
    .bind(Utc::now().to_rfc3339())
    .execute(db_pool)
    .await;

    match result {
        Ok(_) => Ok(()),
        // The UNIQUE(session_id, student_id) constraint is the authoritative
        // duplicate guard; translate it instead of propagating.
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(
                "duplicate attendance entry for {} in session {}",
                student_id,
                session_id
            );
            Err(AppError::DuplicateEntry(display_name.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Matches a scanned identity string against the session's enrolled students
/// and records at most one entry per (session, student). Returns the matched
/// display name.
pub async fn record_entry(
    db_pool: &SqlitePool,
    session_id: &str,
    scanned_name: &str,
) -> AppResult<String> {
    let scanned = scanned_name.trim();
    if scanned.is_empty() {
        return Err(AppError::EmptyIdentity);
    }

    let session = find_session(db_pool, session_id).await?;

    // Enrolled students in listing order (newest enrollment first, matching
    // the roster).
    let students = sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.full_name, u.password_hash, u.role, u.created_at
        FROM users u
        JOIN enrollments e ON e.student_id = u.id
        WHERE e.class_id = ?
        ORDER BY e.enrolled_at DESC, e.id ASC
        "#,
    )
    .bind(&session.class_id)
    .fetch_all(db_pool)
    .await?;

    // Index by normalized display name; on duplicate names the first student
    // in listing order wins.
    let mut by_name: HashMap<String, &User> = HashMap::new();
    for student in &students {
        by_name
            .entry(student.display_name().trim().to_lowercase())
            .or_insert(student);
    }

    let Some(student) = by_name.get(&scanned.to_lowercase()) else {
        tracing::debug!(
            "no enrolled student matching \"{}\" in class {}",
            scanned,
            session.class_id
        );
        return Err(AppError::StudentNotFound(scanned.to_string()));
    };

    let display_name = student.display_name().to_string();
    insert_entry(db_pool, &session.id, &student.id, &display_name).await?;

    tracing::info!(
        "marked attendance for {} in session {}",
        display_name,
        session.id
    );
    Ok(display_name)
}

/// Verifies a session QR payload scanned by an authenticated student and
/// records their entry. The payload must carry `classId` and an ISO-8601
/// `timestamp` no older than [`QR_TOKEN_MAX_AGE_SECS`]; the target session is
/// the most recent one whose stored payload contains that timestamp.
pub async fn verify_qr_payload(
    db_pool: &SqlitePool,
    raw_payload: &str,
    student_id: &str,
    now: DateTime<Utc>,
) -> AppResult<AttendanceSession> {
    let payload: serde_json::Value =
        serde_json::from_str(raw_payload).map_err(|_| AppError::MalformedPayload)?;

    let class_id = payload
        .get("classId")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MalformedPayload)?;
    let timestamp = payload
        .get("timestamp")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or(AppError::MalformedPayload)?;

    let qr_time =
        DateTime::parse_from_rfc3339(timestamp).map_err(|_| AppError::MalformedPayload)?;
    if (now - qr_time.with_timezone(&Utc)).num_seconds() > QR_TOKEN_MAX_AGE_SECS {
        return Err(AppError::ExpiredToken);
    }

    let class_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM classes WHERE id = ?)")
        .bind(class_id)
        .fetch_one(db_pool)
        .await?;
    if !class_exists {
        return Err(AppError::ClassNotFound);
    }

    // Most recently created session whose stored payload carries this
    // timestamp.
    let session = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT id, class_id, date, session_date, schedule_time, qr_code_data, canceled
        FROM attendance_sessions
        WHERE class_id = ?
          AND qr_code_data IS NOT NULL
          AND instr(qr_code_data, ?) > 0
        ORDER BY date DESC
        LIMIT 1
        "#,
    )
    .bind(class_id)
    .bind(timestamp)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::SessionNotFound)?;

    // Identity is already authenticated; no name matching here.
    let student = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    let display_name = student.display_name().to_string();
    insert_entry(db_pool, &session.id, &student.id, &display_name).await?;

    tracing::info!(
        "verified QR for {} in session {}",
        display_name,
        session.id
    );
    Ok(session)
}

// --- Per-student queries ---

pub async fn list_entries(db_pool: &SqlitePool, session_id: &str) -> AppResult<Vec<AttendanceEntry>> {
    let entries = sqlx::query_as::<_, AttendanceEntry>(
        r#"
        SELECT id, session_id, student_id, time_scanned
        FROM attendance_entries
        WHERE session_id = ?
        ORDER BY time_scanned ASC
        "#,
    )
    .bind(session_id)
    .fetch_all(db_pool)
    .await?;
    Ok(entries)
}

/// Sessions of a class the given student has an entry in, newest first.
pub async fn list_attended_sessions(
    db_pool: &SqlitePool,
    class_id: &str,
    student_id: &str,
) -> AppResult<Vec<AttendanceSession>> {
    let sessions = sqlx::query_as::<_, AttendanceSession>(
        r#"
        SELECT DISTINCT s.id, s.class_id, s.date, s.session_date, s.schedule_time,
               s.qr_code_data, s.canceled
        FROM attendance_sessions s
        JOIN attendance_entries a ON a.session_id = s.id
        WHERE s.class_id = ? AND a.student_id = ?
        ORDER BY s.date DESC
        "#,
    )
    .bind(class_id)
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(sessions)
}

pub async fn count_attended_sessions(
    db_pool: &SqlitePool,
    class_id: &str,
    student_id: &str,
) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT s.id)
        FROM attendance_sessions s
        JOIN attendance_entries a ON a.session_id = s.id
        WHERE s.class_id = ? AND a.student_id = ?
        "#,
    )
    .bind(class_id)
    .bind(student_id)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

/// Entries across all sessions of a class, for the attendance-rate stat.
pub async fn count_entries_for_class(db_pool: &SqlitePool, class_id: &str) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM attendance_entries a
        JOIN attendance_sessions s ON s.id = a.session_id
        WHERE s.class_id = ?
        "#,
    )
    .bind(class_id)
    .fetch_one(db_pool)
    .await?;
    Ok(count)
}

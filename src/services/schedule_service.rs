// src/services/schedule_service.rs
//
// Scheduling rules for a class: minute-granularity overlap arithmetic, the
// conflict checker that guards schedule mutations, and the resolver that
// decides which weekly slot (if any) is active at a given instant.
//
// Two deliberately different comparison rules live here:
//   - the conflict checker treats ranges as half-open (touching endpoints do
//     not collide), so back-to-back slots are allowed;
//   - the resolver treats the active window as inclusive on both ends, so a
//     scan at exactly the end time still counts.
// Extra classes participate in conflict checking but not in resolution.
use crate::{
    error::{AppError, AppResult},
    models::schedule::{
        ActiveWindow, ConflictSource, DayOfWeek, ExtraClass, ExtraClassWithClass,
        ScheduleConflict, ScheduleWithClass, WeeklySchedule,
    },
};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

// --- Time-range helpers ---

pub fn to_minutes(t: NaiveTime) -> i32 {
    use chrono::Timelike;
    (t.hour() * 60 + t.minute()) as i32
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
/// Touching endpoints (a_end == b_start) do NOT overlap.
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    to_minutes(a_start) < to_minutes(b_end) && to_minutes(a_end) > to_minutes(b_start)
}

/// 12-hour display format, "H:MM AM/PM". Hours 0 and 12 both show as 12.
pub fn format_12h(t: NaiveTime) -> String {
    use chrono::Timelike;
    let hour = t.hour();
    let am_pm = if hour < 12 { "AM" } else { "PM" };
    let mut display_hour = if hour <= 12 { hour } else { hour - 12 };
    if display_hour == 0 {
        display_hour = 12;
    }
    format!("{}:{:02} {}", display_hour, t.minute(), am_pm)
}

pub fn format_range_12h(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", format_12h(start), format_12h(end))
}

/// The "HH:MM - HH:MM" label identifying a session slot; part of the
/// attendance-session natural key.
pub fn schedule_time_label(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", start.format("%H:%M"), end.format("%H:%M"))
}

pub fn parse_hhmm(s: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| AppError::InvalidTimeRange)
}

pub fn parse_date(s: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| AppError::InvalidTimeRange)
}

// Parses a stored "HH:MM" pair, skipping rows that fail to parse (they can
// only appear through manual DB edits).
fn parse_stored_range(start: &str, end: &str, row_id: &str) -> Option<(NaiveTime, NaiveTime)> {
    match (
        NaiveTime::parse_from_str(start, "%H:%M"),
        NaiveTime::parse_from_str(end, "%H:%M"),
    ) {
        (Ok(s), Ok(e)) => Some((s, e)),
        _ => {
            tracing::warn!("unparsable time range on row {}: {} - {}", row_id, start, end);
            None
        }
    }
}

/// First stored range overlapping the proposed one, as a display-ready
/// conflict. Candidate order decides which conflict is reported.
fn first_overlap(
    candidates: &[(NaiveTime, NaiveTime, ConflictSource)],
    start: NaiveTime,
    end: NaiveTime,
) -> Option<ScheduleConflict> {
    candidates
        .iter()
        .find(|(c_start, c_end, _)| overlaps(start, end, *c_start, *c_end))
        .map(|(c_start, c_end, source)| ScheduleConflict {
            range: format_range_12h(*c_start, *c_end),
            source: *source,
        })
}

// --- Queries ---

pub async fn list_schedules(db_pool: &SqlitePool, class_id: &str) -> AppResult<Vec<WeeklySchedule>> {
    let schedules = sqlx::query_as::<_, WeeklySchedule>(
        r#"
        SELECT id, class_id, day, start_time, end_time
        FROM schedules
        WHERE class_id = ?
        ORDER BY day ASC, start_time ASC
        "#,
    )
    .bind(class_id)
    .fetch_all(db_pool)
    .await?;
    Ok(schedules)
}

async fn list_schedules_for_day(
    db_pool: &SqlitePool,
    class_id: &str,
    day: &str,
) -> AppResult<Vec<WeeklySchedule>> {
    let schedules = sqlx::query_as::<_, WeeklySchedule>(
        r#"
        SELECT id, class_id, day, start_time, end_time
        FROM schedules
        WHERE class_id = ? AND day = ?
        ORDER BY start_time ASC
        "#,
    )
    .bind(class_id)
    .bind(day)
    .fetch_all(db_pool)
    .await?;
    Ok(schedules)
}

pub async fn list_extra_classes(db_pool: &SqlitePool, class_id: &str) -> AppResult<Vec<ExtraClass>> {
    let extras = sqlx::query_as::<_, ExtraClass>(
        r#"
        SELECT id, class_id, date, start_time, end_time, reason, created_at
        FROM extra_classes
        WHERE class_id = ?
        ORDER BY date ASC, start_time ASC
        "#,
    )
    .bind(class_id)
    .fetch_all(db_pool)
    .await?;
    Ok(extras)
}

async fn list_extra_classes_on_date(
    db_pool: &SqlitePool,
    class_id: &str,
    date: &str,
) -> AppResult<Vec<ExtraClass>> {
    let extras = sqlx::query_as::<_, ExtraClass>(
        r#"
        SELECT id, class_id, date, start_time, end_time, reason, created_at
        FROM extra_classes
        WHERE class_id = ? AND date = ?
        ORDER BY start_time ASC
        "#,
    )
    .bind(class_id)
    .bind(date)
    .fetch_all(db_pool)
    .await?;
    Ok(extras)
}

/// Weekly slots across all of a student's enrolled classes, for the calendar.
pub async fn list_schedules_for_student(
    db_pool: &SqlitePool,
    student_id: &str,
) -> AppResult<Vec<ScheduleWithClass>> {
    let rows = sqlx::query_as::<_, ScheduleWithClass>(
        r#"
        SELECT s.id, s.class_id, c.subject AS class_name, s.day, s.start_time, s.end_time
        FROM schedules s
        JOIN classes c ON c.id = s.class_id
        JOIN enrollments e ON e.class_id = s.class_id
        WHERE e.student_id = ?
        ORDER BY s.day ASC, s.start_time ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

/// One-off sessions across all of a student's enrolled classes.
pub async fn list_extra_classes_for_student(
    db_pool: &SqlitePool,
    student_id: &str,
) -> AppResult<Vec<ExtraClassWithClass>> {
    let rows = sqlx::query_as::<_, ExtraClassWithClass>(
        r#"
        SELECT x.id, x.class_id, c.subject AS class_name, x.date, x.start_time, x.end_time,
               x.reason
        FROM extra_classes x
        JOIN classes c ON c.id = x.class_id
        JOIN enrollments e ON e.class_id = x.class_id
        WHERE e.student_id = ?
        ORDER BY x.date ASC, x.start_time ASC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(rows)
}

// --- Conflict checker ---

/// Validates a proposed weekly slot against the class's other weekly slots on
/// the same day. Pure query + comparison; persistence stays with the caller
/// and must only happen on `Ok(None)`.
pub async fn check_weekly_conflict(
    db_pool: &SqlitePool,
    class_id: &str,
    day: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
    excluding_schedule_id: Option<&str>,
) -> AppResult<Option<ScheduleConflict>> {
    if start >= end {
        return Err(AppError::InvalidTimeRange);
    }

    let existing = list_schedules_for_day(db_pool, class_id, day.as_str()).await?;
    let candidates: Vec<(NaiveTime, NaiveTime, ConflictSource)> = existing
        .iter()
        .filter(|s| excluding_schedule_id != Some(s.id.as_str()))
        .filter_map(|s| parse_stored_range(&s.start_time, &s.end_time, &s.id))
        .map(|(s, e)| (s, e, ConflictSource::WeeklySchedule))
        .collect();

    Ok(first_overlap(&candidates, start, end))
}

/// Validates a proposed one-off session against the weekly slots falling on
/// that date's weekday and against the other extra classes on the same date.
pub async fn check_extra_conflict(
    db_pool: &SqlitePool,
    class_id: &str,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> AppResult<Option<ScheduleConflict>> {
    if start >= end {
        return Err(AppError::InvalidTimeRange);
    }

    let day = DayOfWeek::from_chrono(date.weekday());
    let date_str = date.format("%Y-%m-%d").to_string();

    let mut candidates: Vec<(NaiveTime, NaiveTime, ConflictSource)> = Vec::new();
    for s in list_schedules_for_day(db_pool, class_id, day.as_str()).await? {
        if let Some((cs, ce)) = parse_stored_range(&s.start_time, &s.end_time, &s.id) {
            candidates.push((cs, ce, ConflictSource::WeeklySchedule));
        }
    }
    for x in list_extra_classes_on_date(db_pool, class_id, &date_str).await? {
        if let Some((cs, ce)) = parse_stored_range(&x.start_time, &x.end_time, &x.id) {
            candidates.push((cs, ce, ConflictSource::ExtraClass));
        }
    }

    Ok(first_overlap(&candidates, start, end))
}

// --- Mutations (conflict-checked) ---

pub async fn add_schedule(
    db_pool: &SqlitePool,
    class_id: &str,
    day: DayOfWeek,
    start: NaiveTime,
    end: NaiveTime,
) -> AppResult<WeeklySchedule> {
    if let Some(conflict) = check_weekly_conflict(db_pool, class_id, day, start, end, None).await? {
        tracing::warn!(
            "rejected schedule for class {}: conflicts with {} ({})",
            class_id,
            conflict.source,
            conflict.range
        );
        return Err(AppError::ScheduleConflict(conflict));
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO schedules (id, class_id, day, start_time, end_time)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(class_id)
    .bind(day.as_str())
    .bind(start.format("%H:%M").to_string())
    .bind(end.format("%H:%M").to_string())
    .execute(db_pool)
    .await?;

    tracing::info!(
        "added schedule {} for class {}: {} {} - {}",
        id,
        class_id,
        day,
        start.format("%H:%M"),
        end.format("%H:%M")
    );

    Ok(WeeklySchedule {
        id,
        class_id: class_id.to_string(),
        day: day.as_str().to_string(),
        start_time: start.format("%H:%M").to_string(),
        end_time: end.format("%H:%M").to_string(),
    })
}

pub async fn delete_schedule(
    db_pool: &SqlitePool,
    class_id: &str,
    schedule_id: &str,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM schedules WHERE id = ? AND class_id = ?")
        .bind(schedule_id)
        .bind(class_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("deleted schedule {} from class {}", schedule_id, class_id);
    Ok(())
}

pub async fn add_extra_class(
    db_pool: &SqlitePool,
    class_id: &str,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    reason: Option<&str>,
) -> AppResult<ExtraClass> {
    if let Some(conflict) = check_extra_conflict(db_pool, class_id, date, start, end).await? {
        tracing::warn!(
            "rejected extra class for class {}: conflicts with {} ({})",
            class_id,
            conflict.source,
            conflict.range
        );
        return Err(AppError::ScheduleConflict(conflict));
    }

    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO extra_classes (id, class_id, date, start_time, end_time, reason, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(class_id)
    .bind(date.format("%Y-%m-%d").to_string())
    .bind(start.format("%H:%M").to_string())
    .bind(end.format("%H:%M").to_string())
    .bind(reason)
    .bind(&created_at)
    .execute(db_pool)
    .await?;

    Ok(ExtraClass {
        id,
        class_id: class_id.to_string(),
        date: date.format("%Y-%m-%d").to_string(),
        start_time: start.format("%H:%M").to_string(),
        end_time: end.format("%H:%M").to_string(),
        reason: reason.map(|r| r.to_string()),
        created_at,
    })
}

pub async fn delete_extra_class(
    db_pool: &SqlitePool,
    class_id: &str,
    extra_id: &str,
) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM extra_classes WHERE id = ? AND class_id = ?")
        .bind(extra_id)
        .bind(class_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

// --- Active-session resolver ---

/// Finds the weekly slot whose window contains `at`, normalized to the
/// configured timezone. Boundaries are inclusive on both ends. Extra classes
/// are intentionally not consulted here.
pub async fn resolve_active_window(
    db_pool: &SqlitePool,
    class_id: &str,
    at: DateTime<Utc>,
    tz: FixedOffset,
) -> AppResult<Option<ActiveWindow>> {
    let local = at.with_timezone(&tz);
    let day_name = DayOfWeek::from_chrono(local.weekday());
    let now_time = local.time();

    let schedules = list_schedules_for_day(db_pool, class_id, day_name.as_str()).await?;
    for schedule in schedules {
        let Some((start, end)) =
            parse_stored_range(&schedule.start_time, &schedule.end_time, &schedule.id)
        else {
            continue;
        };
        if start <= now_time && now_time <= end {
            let schedule_time = schedule_time_label(start, end);
            tracing::debug!(
                "class {} active at {} {}: schedule {} ({})",
                class_id,
                day_name,
                now_time.format("%H:%M:%S"),
                schedule.id,
                schedule_time
            );
            return Ok(Some(ActiveWindow {
                schedule,
                schedule_time,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn to_minutes_is_hour_times_sixty_plus_minute() {
        assert_eq!(to_minutes(t(0, 0)), 0);
        assert_eq!(to_minutes(t(9, 30)), 570);
        assert_eq!(to_minutes(t(23, 59)), 1439);
    }

    #[test]
    fn overlaps_is_symmetric() {
        let cases = [
            (t(9, 0), t(10, 30), t(10, 0), t(11, 0), true),
            (t(9, 0), t(10, 0), t(10, 0), t(11, 0), false),
            (t(9, 0), t(12, 0), t(10, 0), t(11, 0), true),
            (t(9, 0), t(9, 30), t(11, 0), t(12, 0), false),
        ];
        for (a1, a2, b1, b2, expected) in cases {
            assert_eq!(overlaps(a1, a2, b1, b2), expected);
            assert_eq!(overlaps(b1, b2, a1, a2), expected);
        }
    }

    #[test]
    fn touching_endpoints_do_not_overlap() {
        assert!(!overlaps(t(9, 0), t(10, 0), t(10, 0), t(11, 0)));
        assert!(!overlaps(t(10, 0), t(11, 0), t(9, 0), t(10, 0)));
    }

    #[test]
    fn identical_ranges_overlap() {
        assert!(overlaps(t(9, 0), t(10, 30), t(9, 0), t(10, 30)));
    }

    #[test]
    fn format_12h_handles_midnight_and_noon() {
        assert_eq!(format_12h(t(0, 5)), "12:05 AM");
        assert_eq!(format_12h(t(12, 0)), "12:00 PM");
        assert_eq!(format_12h(t(12, 30)), "12:30 PM");
        assert_eq!(format_12h(t(9, 0)), "9:00 AM");
        assert_eq!(format_12h(t(13, 15)), "1:15 PM");
        assert_eq!(format_12h(t(23, 59)), "11:59 PM");
    }

    #[test]
    fn schedule_time_label_is_zero_padded_24h() {
        assert_eq!(schedule_time_label(t(9, 0), t(10, 30)), "09:00 - 10:30");
        assert_eq!(schedule_time_label(t(0, 0), t(1, 5)), "00:00 - 01:05");
    }

    #[test]
    fn first_overlap_reports_first_candidate_in_order() {
        let candidates = vec![
            (t(7, 0), t(8, 0), ConflictSource::WeeklySchedule),
            (t(9, 0), t(10, 30), ConflictSource::WeeklySchedule),
            (t(10, 0), t(11, 0), ConflictSource::ExtraClass),
        ];
        let conflict = first_overlap(&candidates, t(10, 0), t(12, 0)).unwrap();
        assert_eq!(conflict.source, ConflictSource::WeeklySchedule);
        assert_eq!(conflict.range, "9:00 AM - 10:30 AM");
    }

    #[test]
    fn first_overlap_none_when_all_disjoint() {
        let candidates = vec![(t(7, 0), t(8, 0), ConflictSource::WeeklySchedule)];
        assert!(first_overlap(&candidates, t(8, 0), t(9, 0)).is_none());
    }

    #[test]
    fn parse_hhmm_rejects_garbage() {
        assert!(parse_hhmm("09:00").is_ok());
        assert!(parse_hhmm(" 23:59 ").is_ok());
        assert!(parse_hhmm("9am").is_err());
        assert!(parse_hhmm("25:00").is_err());
    }
}

// tests/schedule_rules.rs
//
// Conflict-checker and resolver behavior against a real (in-memory) store.
mod common;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use classcheck::error::AppError;
use classcheck::models::schedule::{ConflictSource, DayOfWeek};
use classcheck::services::schedule_service;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn manila() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

/// A UTC instant whose Manila local time is the given RFC3339 wall clock.
fn at(local_rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(local_rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn weekly_conflict_on_same_day_overlap() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    let conflict =
        schedule_service::check_weekly_conflict(&pool, &class.id, DayOfWeek::Monday, t(10, 0), t(11, 0), None)
            .await
            .unwrap()
            .expect("overlapping range must conflict");
    assert_eq!(conflict.source, ConflictSource::WeeklySchedule);
    assert_eq!(conflict.range, "9:00 AM - 10:30 AM");
}

#[tokio::test]
async fn weekly_no_conflict_when_disjoint_or_touching() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    // Disjoint
    assert!(schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(11, 0), t(12, 0), None
    )
    .await
    .unwrap()
    .is_none());

    // Touching endpoint: existing end == proposed start
    assert!(schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(10, 30), t(12, 0), None
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn weekly_same_range_other_day_is_fine() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    assert!(schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Tuesday, t(9, 0), t(10, 30), None
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn weekly_conflict_rejects_inverted_range() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    let err = schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(10, 0), t(9, 0), None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimeRange));

    let err = schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(9, 0), t(9, 0), None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::InvalidTimeRange));
}

#[tokio::test]
async fn weekly_conflict_can_exclude_the_schedule_being_edited() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    let schedule =
        schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
            .await
            .unwrap();

    // Same range collides with itself unless excluded.
    assert!(schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30), None
    )
    .await
    .unwrap()
    .is_some());

    assert!(schedule_service::check_weekly_conflict(
        &pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30), Some(&schedule.id)
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn add_schedule_refuses_conflicting_slot() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();
    let err = schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(10, 0), t(11, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ScheduleConflict(_)));

    // Nothing was persisted for the rejected slot.
    let schedules = schedule_service::list_schedules(&pool, &class.id).await.unwrap();
    assert_eq!(schedules.len(), 1);
}

#[tokio::test]
async fn extra_conflicts_against_weekly_on_that_weekday() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    // 2025-06-02 is a Monday.
    let conflict =
        schedule_service::check_extra_conflict(&pool, &class.id, d("2025-06-02"), t(10, 0), t(11, 0))
            .await
            .unwrap()
            .expect("extra on a Monday must collide with the Monday slot");
    assert_eq!(conflict.source, ConflictSource::WeeklySchedule);

    // Same range on a Tuesday is fine.
    assert!(schedule_service::check_extra_conflict(
        &pool, &class.id, d("2025-06-03"), t(10, 0), t(11, 0)
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn extra_conflicts_against_other_extras_on_same_date() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_extra_class(&pool, &class.id, d("2025-06-03"), t(14, 0), t(15, 30), Some("Review session"))
        .await
        .unwrap();

    let conflict =
        schedule_service::check_extra_conflict(&pool, &class.id, d("2025-06-03"), t(15, 0), t(16, 0))
            .await
            .unwrap()
            .expect("overlapping extras on one date must conflict");
    assert_eq!(conflict.source, ConflictSource::ExtraClass);

    // Same times the next day do not.
    assert!(schedule_service::check_extra_conflict(
        &pool, &class.id, d("2025-06-04"), t(15, 0), t(16, 0)
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn resolver_uses_inclusive_boundaries() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;
    let tz = manila();

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    // 2025-06-02 is a Monday in Manila.
    for instant in [
        "2025-06-02T09:00:00+08:00",
        "2025-06-02T09:45:00+08:00",
        "2025-06-02T10:30:00+08:00",
    ] {
        let window = schedule_service::resolve_active_window(&pool, &class.id, at(instant), tz)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("{} must be inside the window", instant));
        assert_eq!(window.schedule_time, "09:00 - 10:30");
    }

    for instant in ["2025-06-02T08:59:00+08:00", "2025-06-02T10:31:00+08:00"] {
        assert!(
            schedule_service::resolve_active_window(&pool, &class.id, at(instant), tz)
                .await
                .unwrap()
                .is_none(),
            "{} must be outside the window",
            instant
        );
    }
}

#[tokio::test]
async fn resolver_ignores_other_weekdays_and_extras() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;
    let tz = manila();

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();
    // An extra class covering the probe instant on a Tuesday; the resolver
    // only consults weekly slots.
    schedule_service::add_extra_class(&pool, &class.id, d("2025-06-03"), t(9, 0), t(10, 30), None)
        .await
        .unwrap();

    assert!(schedule_service::resolve_active_window(
        &pool,
        &class.id,
        at("2025-06-03T09:15:00+08:00"),
        tz
    )
    .await
    .unwrap()
    .is_none());
}

#[tokio::test]
async fn resolver_timezone_is_injected_not_global() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Algorithms").await;

    schedule_service::add_schedule(&pool, &class.id, DayOfWeek::Monday, t(9, 0), t(10, 30))
        .await
        .unwrap();

    // 01:15 UTC on a Monday is 09:15 in Manila but 01:15 in UTC+0.
    let instant = at("2025-06-02T01:15:00+00:00");
    assert!(
        schedule_service::resolve_active_window(&pool, &class.id, instant, manila())
            .await
            .unwrap()
            .is_some()
    );
    assert!(schedule_service::resolve_active_window(
        &pool,
        &class.id,
        instant,
        FixedOffset::east_opt(0).unwrap()
    )
    .await
    .unwrap()
    .is_none());
}

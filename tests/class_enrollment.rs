// tests/class_enrollment.rs
//
// Class creation (code generation), editing, announcements and the
// enrollment lifecycle.
mod common;

use classcheck::error::AppError;
use classcheck::models::class::ClassForm;
use classcheck::services::class_service;
use std::collections::HashSet;

#[tokio::test]
async fn class_codes_are_six_uppercase_alphanumerics_and_unique() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;

    let mut seen = HashSet::new();
    for i in 0..20 {
        let class = common::create_class(&pool, &prof, &format!("Subject {}", i)).await;
        assert_eq!(class.class_code.len(), 6);
        assert!(class
            .class_code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        assert!(
            seen.insert(class.class_code.clone()),
            "duplicate class code generated: {}",
            class.class_code
        );
    }
}

#[tokio::test]
async fn editing_a_class_never_touches_its_code() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Physics").await;

    let edited = class_service::edit_class(
        &pool,
        &class.id,
        &prof,
        &ClassForm {
            subject: "Physics II".to_string(),
            section: Some("B".to_string()),
            room: Some("Room 301".to_string()),
            description: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(edited.subject, "Physics II");
    assert_eq!(edited.section.as_deref(), Some("B"));
    assert_eq!(edited.class_code, class.class_code);
}

#[tokio::test]
async fn only_the_owner_may_edit_a_class() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let other = common::insert_professor(&pool, "other").await;
    let class = common::create_class(&pool, &prof, "Physics").await;

    let err = class_service::edit_class(
        &pool,
        &class.id,
        &other,
        &ClassForm {
            subject: "Hijacked".to_string(),
            section: None,
            room: None,
            description: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotOwner));

    let err = class_service::find_owned_class(&pool, "no-such-class", &prof).await.unwrap_err();
    assert!(matches!(err, AppError::ClassNotFound));
}

#[tokio::test]
async fn enrollment_lifecycle() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Chemistry").await;
    let student = common::insert_student(&pool, "jdoe", "Jane Doe").await;

    // Unknown code
    let err = class_service::enroll_by_code(&pool, &student, "ZZZZZZ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidClassCode));

    // Join (codes are matched case-insensitively by uppercasing the input)
    let joined = class_service::enroll_by_code(&pool, &student, &class.class_code.to_lowercase())
        .await
        .unwrap();
    assert_eq!(joined.id, class.id);
    assert!(class_service::is_enrolled(&pool, &student, &class.id).await.unwrap());

    // Joining again is rejected
    let err = class_service::enroll_by_code(&pool, &student, &class.class_code).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyEnrolled));

    // Leave, then leaving again is a no-op error
    class_service::leave_class(&pool, &student, &class.id).await.unwrap();
    assert!(!class_service::is_enrolled(&pool, &student, &class.id).await.unwrap());
    let err = class_service::leave_class(&pool, &student, &class.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn announcements_are_listed_newest_first_with_limit() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "History").await;

    for i in 1..=5 {
        class_service::post_announcement(&pool, &class.id, &format!("Title {}", i), "body")
            .await
            .unwrap();
        // Distinct created_at values so the ordering is deterministic.
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let all = class_service::list_announcements(&pool, &class.id, None).await.unwrap();
    assert_eq!(all.len(), 5);
    assert_eq!(all[0].title, "Title 5");

    let latest = class_service::list_announcements(&pool, &class.id, Some(3)).await.unwrap();
    assert_eq!(latest.len(), 3);
    assert_eq!(latest[0].title, "Title 5");
    assert_eq!(latest[2].title, "Title 3");
}

#[tokio::test]
async fn class_stats_compute_the_attendance_rate() {
    let pool = common::test_pool().await;
    let prof = common::insert_professor(&pool, "prof").await;
    let class = common::create_class(&pool, &prof, "Biology").await;

    // No students, no sessions: rate is zero.
    let stats = class_service::class_stats(&pool, &class.id).await.unwrap();
    assert_eq!(stats.total_students, 0);
    assert_eq!(stats.total_sessions, 0);
    assert_eq!(stats.attendance_rate, 0);

    use chrono::Utc;
    use classcheck::services::attendance_service;

    let jane = common::insert_student(&pool, "jdoe", "Jane Doe").await;
    let juan = common::insert_student(&pool, "jcruz", "Juan Cruz").await;
    common::enroll(&pool, &jane, &class).await;
    common::enroll(&pool, &juan, &class).await;

    let (session, _) = attendance_service::get_or_create_session(
        &pool,
        &class.id,
        chrono::NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        "09:00 - 10:30",
        Utc::now(),
    )
    .await
    .unwrap();
    attendance_service::record_entry(&pool, &session.id, "Jane Doe").await.unwrap();

    // 1 entry over 2 students x 1 session = 50%.
    let stats = class_service::class_stats(&pool, &class.id).await.unwrap();
    assert_eq!(stats.total_students, 2);
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.attendance_rate, 50);
}

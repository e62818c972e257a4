// src/web/student_handlers.rs
//
// Student-facing endpoints: enrollment, dashboards, the personal name QR and
// the time-bounded verification of a professor's session QR.
use std::collections::BTreeMap;

use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{ScanResponse, VerifyQrForm},
        class::JoinClassForm,
    },
    services::{attendance_service, class_service, schedule_service, user_service},
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

// GET /student/classes
//
// Enrolled classes with their schedules, latest announcements and the
// student's own attendance count, plus the calendar feeds (weekly slots
// grouped by day, extra classes and cancellations grouped by date).
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let classes = class_service::list_enrolled_classes(&state.db_pool, &user_id.0).await?;

    let mut classes_with_stats = Vec::with_capacity(classes.len());
    for class in &classes {
        let schedules = schedule_service::list_schedules(&state.db_pool, &class.id).await?;
        let announcements =
            class_service::list_announcements(&state.db_pool, &class.id, Some(3)).await?;
        let attendance_count =
            attendance_service::count_attended_sessions(&state.db_pool, &class.id, &user_id.0)
                .await?;

        classes_with_stats.push(json!({
            "class": class,
            "schedules": schedules,
            "announcements": announcements,
            "attendance_count": attendance_count,
        }));
    }

    // Calendar feeds, grouped the way the dashboard consumes them.
    let mut schedules_by_day: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
    for s in schedule_service::list_schedules_for_student(&state.db_pool, &user_id.0).await? {
        schedules_by_day.entry(s.day.clone()).or_default().push(json!({
            "id": s.id,
            "class_id": s.class_id,
            "class_name": s.class_name,
            "start_time": s.start_time,
            "end_time": s.end_time,
        }));
    }

    let mut extra_classes_by_date: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
    for x in schedule_service::list_extra_classes_for_student(&state.db_pool, &user_id.0).await? {
        extra_classes_by_date.entry(x.date.clone()).or_default().push(json!({
            "id": x.id,
            "class_id": x.class_id,
            "class_name": x.class_name,
            "start_time": x.start_time,
            "end_time": x.end_time,
            "reason": x.reason.unwrap_or_default(),
        }));
    }

    let mut canceled_classes: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
    for c in attendance_service::list_canceled_for_student(&state.db_pool, &user_id.0).await? {
        canceled_classes
            .entry(c.session_date.clone())
            .or_default()
            .push(json!({
                "class_id": c.class_id,
                "class_name": c.class_name,
                "schedule_time": c.schedule_time,
            }));
    }

    Ok(Json(json!({
        "success": true,
        "classes": classes_with_stats,
        "schedules_by_day": schedules_by_day,
        "extra_classes_by_date": extra_classes_by_date,
        "canceled_classes": canceled_classes,
    })))
}

// POST /student/join
pub async fn join_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<JoinClassForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::enroll_by_code(&state.db_pool, &user_id.0, &form.class_code).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Successfully joined \"{}\"!", class.subject),
        "class": class,
    })))
}

// GET /student/classes/{id}
pub async fn class_detail(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !class_service::is_enrolled(&state.db_pool, &user_id.0, &class_id).await? {
        return Err(AppError::NotFound);
    }
    let class = class_service::find_class(&state.db_pool, &class_id).await?;

    let schedules = schedule_service::list_schedules(&state.db_pool, &class.id).await?;
    let announcements = class_service::list_announcements(&state.db_pool, &class.id, None).await?;
    let attended =
        attendance_service::list_attended_sessions(&state.db_pool, &class.id, &user_id.0).await?;
    let total_sessions = attendance_service::count_sessions(&state.db_pool, &class.id).await?;

    Ok(Json(json!({
        "success": true,
        "class": class,
        "schedules": schedules,
        "announcements": announcements,
        "attendance_records": attended,
        "total_attendance": attended.len(),
        "total_sessions": total_sessions,
    })))
}

// POST /student/classes/{id}/leave
pub async fn leave_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    class_service::leave_class(&state.db_pool, &user_id.0, &class_id).await?;
    Ok(Json(json!({ "success": true })))
}

// GET /student/qr
//
// The student's personal QR encodes only their display name; professors
// match it against the roster when scanning.
pub async fn my_qr_code(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let user = user_service::find_user_by_id(&state.db_pool, &user_id.0)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let student_name = user.display_name().to_string();
    Ok(Json(json!({
        "success": true,
        "student_name": student_name,
        "qr_data": student_name,
    })))
}

// POST /student/verify_qr
//
// Verifies a scanned session QR payload and marks the logged-in student's
// attendance. Outcomes are mapped onto the scan wire shape.
pub async fn verify_qr(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<VerifyQrForm>,
) -> AppResult<Response> {
    let outcome = attendance_service::verify_qr_payload(
        &state.db_pool,
        &form.qr_code_data,
        &user_id.0,
        Utc::now(),
    )
    .await;

    let response = match outcome {
        Ok(_session) => (
            StatusCode::OK,
            Json(ScanResponse {
                success: true,
                message: Some("Attendance marked successfully".to_string()),
                ..Default::default()
            }),
        ),
        Err(AppError::MalformedPayload) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some("Invalid QR code data".to_string()),
                ..Default::default()
            }),
        ),
        Err(AppError::ExpiredToken) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some("QR code has expired".to_string()),
                ..Default::default()
            }),
        ),
        Err(AppError::SessionNotFound) => (
            StatusCode::NOT_FOUND,
            Json(ScanResponse {
                error: Some("Attendance session not found".to_string()),
                ..Default::default()
            }),
        ),
        Err(AppError::DuplicateEntry(name)) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some("Attendance already marked".to_string()),
                student_name: Some(name),
                already_marked: Some(true),
                ..Default::default()
            }),
        ),
        Err(other) => return Err(other),
    };

    Ok(response.into_response())
}

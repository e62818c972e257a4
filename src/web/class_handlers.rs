// src/web/class_handlers.rs
//
// Professor-facing endpoints: class CRUD, schedules, announcements and the
// two scanning flows (session QR activation + camera scan processing).
use crate::{
    error::{AppError, AppResult},
    models::{
        attendance::{QrPayload, ScanForm, ScanResponse},
        class::{AnnouncementForm, ClassForm},
        schedule::{ExtraClassForm, ScheduleForm},
    },
    services::{attendance_service, class_service, schedule_service},
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

// GET /professor/classes
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
) -> AppResult<impl IntoResponse> {
    let classes = class_service::list_classes_with_counts(&state.db_pool, &user_id.0).await?;
    Ok(Json(json!({ "success": true, "classes": classes })))
}

// POST /professor/classes
pub async fn create_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(form): Json<ClassForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::create_class(&state.db_pool, &user_id.0, &form).await?;
    Ok(Json(json!({ "success": true, "class": class })))
}

// GET /professor/classes/{id}
pub async fn class_detail(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let schedules = schedule_service::list_schedules(&state.db_pool, &class.id).await?;
    let extra_classes = schedule_service::list_extra_classes(&state.db_pool, &class.id).await?;
    let announcements = class_service::list_announcements(&state.db_pool, &class.id, None).await?;
    let sessions = attendance_service::list_sessions(&state.db_pool, &class.id).await?;
    let stats = class_service::class_stats(&state.db_pool, &class.id).await?;

    Ok(Json(json!({
        "success": true,
        "class": class,
        "schedules": schedules,
        "extra_classes": extra_classes,
        "announcements": announcements,
        "attendance_sessions": sessions,
        "stats": stats,
    })))
}

// POST /professor/classes/{id}/edit
pub async fn edit_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
    Json(form): Json<ClassForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::edit_class(&state.db_pool, &class_id, &user_id.0, &form).await?;
    Ok(Json(json!({ "success": true, "class": class })))
}

// POST /professor/classes/{id}/schedules
pub async fn add_schedule(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
    Json(form): Json<ScheduleForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let start = schedule_service::parse_hhmm(&form.start_time)?;
    let end = schedule_service::parse_hhmm(&form.end_time)?;
    let schedule =
        schedule_service::add_schedule(&state.db_pool, &class.id, form.day, start, end).await?;

    Ok(Json(json!({ "success": true, "schedule": schedule })))
}

// POST /professor/classes/{id}/schedules/{schedule_id}/delete
pub async fn delete_schedule(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path((class_id, schedule_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;
    schedule_service::delete_schedule(&state.db_pool, &class.id, &schedule_id).await?;
    Ok(Json(json!({ "success": true })))
}

// POST /professor/classes/{id}/extra_classes
pub async fn add_extra_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
    Json(form): Json<ExtraClassForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let date = schedule_service::parse_date(&form.date)?;
    let start = schedule_service::parse_hhmm(&form.start_time)?;
    let end = schedule_service::parse_hhmm(&form.end_time)?;
    let extra = schedule_service::add_extra_class(
        &state.db_pool,
        &class.id,
        date,
        start,
        end,
        form.reason.as_deref(),
    )
    .await?;

    Ok(Json(json!({ "success": true, "extra_class": extra })))
}

// POST /professor/classes/{id}/extra_classes/{extra_id}/delete
pub async fn delete_extra_class(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path((class_id, extra_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;
    schedule_service::delete_extra_class(&state.db_pool, &class.id, &extra_id).await?;
    Ok(Json(json!({ "success": true })))
}

// POST /professor/classes/{id}/announcements
pub async fn post_announcement(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
    Json(form): Json<AnnouncementForm>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;
    let announcement =
        class_service::post_announcement(&state.db_pool, &class.id, &form.title, &form.content)
            .await?;
    Ok(Json(json!({ "success": true, "announcement": announcement })))
}

// POST /professor/classes/{id}/sessions/{session_id}/toggle_cancel
pub async fn toggle_cancellation(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path((class_id, session_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let session = attendance_service::find_session(&state.db_pool, &session_id).await?;
    if session.class_id != class.id {
        return Err(AppError::SessionNotFound);
    }

    let session = attendance_service::toggle_cancellation(&state.db_pool, &session_id).await?;
    Ok(Json(json!({ "success": true, "session": session })))
}

// GET /professor/classes/{id}/qr
//
// Activates scanning for the current session: requires an active weekly
// window right now, get-or-creates the session row and stores a fresh QR
// payload on it.
pub async fn activate_scanning(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let now = Utc::now();
    let window = schedule_service::resolve_active_window(&state.db_pool, &class.id, now, state.tz)
        .await?
        .ok_or(AppError::NoActiveSchedule)?;

    let local_now = now.with_timezone(&state.tz);
    let (session, _created) = attendance_service::get_or_create_session(
        &state.db_pool,
        &class.id,
        local_now.date_naive(),
        &window.schedule_time,
        now,
    )
    .await?;

    let qr_data = QrPayload {
        class_id: class.id.clone(),
        class_name: class.subject.clone(),
        professor_id: user_id.0.clone(),
        timestamp: now.to_rfc3339(),
    };
    let payload = serde_json::to_string(&qr_data).map_err(|_| AppError::InternalServerError)?;
    attendance_service::set_qr_payload(&state.db_pool, &session.id, &payload).await?;

    Ok(Json(json!({
        "success": true,
        "qr_data": qr_data,
        "schedule_time": window.schedule_time,
        "session_id": session.id,
    })))
}

// POST /professor/classes/{id}/scan
//
// Processes a scanned student QR (the student's display name) during an
// active window. Every outcome is mapped onto the scan wire shape.
pub async fn process_scan(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(class_id): Path<String>,
    Json(form): Json<ScanForm>,
) -> AppResult<Response> {
    let class = class_service::find_owned_class(&state.db_pool, &class_id, &user_id.0).await?;

    let now = Utc::now();
    let outcome = async {
        let window =
            schedule_service::resolve_active_window(&state.db_pool, &class.id, now, state.tz)
                .await?
                .ok_or(AppError::NoActiveSchedule)?;

        let local_now = now.with_timezone(&state.tz);
        let (session, _) = attendance_service::get_or_create_session(
            &state.db_pool,
            &class.id,
            local_now.date_naive(),
            &window.schedule_time,
            now,
        )
        .await?;

        attendance_service::record_entry(&state.db_pool, &session.id, &form.student_name).await
    }
    .await;

    let response = match outcome {
        Ok(display_name) => (
            StatusCode::OK,
            Json(ScanResponse {
                success: true,
                message: Some(format!("Attendance marked for {}", display_name)),
                student_name: Some(display_name),
                ..Default::default()
            }),
        ),
        Err(AppError::EmptyIdentity) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some("No student name provided".to_string()),
                ..Default::default()
            }),
        ),
        Err(AppError::NoActiveSchedule) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some(
                    "No active class schedule at this time. QR scanning is only allowed during scheduled class hours."
                        .to_string(),
                ),
                ..Default::default()
            }),
        ),
        Err(AppError::StudentNotFound(name)) => (
            StatusCode::NOT_FOUND,
            Json(ScanResponse {
                error: Some(format!(
                    "No enrolled student in this class found with name \"{}\"",
                    name
                )),
                student_name: Some(name),
                ..Default::default()
            }),
        ),
        Err(AppError::DuplicateEntry(name)) => (
            StatusCode::BAD_REQUEST,
            Json(ScanResponse {
                error: Some(format!("Attendance already marked for {}", name)),
                student_name: Some(name),
                already_marked: Some(true),
                ..Default::default()
            }),
        ),
        Err(other) => return Err(other),
    };

    Ok(response.into_response())
}

// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        auth_handlers, class_handlers, mw_auth, mw_professor, mw_student, student_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Public routes ---
    let public_routes = Router::new()
        .route("/signup/student", post(auth_handlers::signup_student))
        .route("/signup/professor", post(auth_handlers::signup_professor))
        .route("/login/student", post(auth_handlers::login_student))
        .route("/login/professor", post(auth_handlers::login_professor));

    // --- Professor routes ---
    // Require login AND the professor role
    let professor_routes = Router::new()
        .route(
            "/classes",
            get(class_handlers::dashboard).post(class_handlers::create_class),
        )
        .route("/classes/{id}", get(class_handlers::class_detail))
        .route("/classes/{id}/edit", post(class_handlers::edit_class))
        .route("/classes/{id}/schedules", post(class_handlers::add_schedule))
        .route(
            "/classes/{id}/schedules/{schedule_id}/delete",
            post(class_handlers::delete_schedule),
        )
        .route(
            "/classes/{id}/extra_classes",
            post(class_handlers::add_extra_class),
        )
        .route(
            "/classes/{id}/extra_classes/{extra_id}/delete",
            post(class_handlers::delete_extra_class),
        )
        .route(
            "/classes/{id}/announcements",
            post(class_handlers::post_announcement),
        )
        .route(
            "/classes/{id}/sessions/{session_id}/toggle_cancel",
            post(class_handlers::toggle_cancellation),
        )
        .route("/classes/{id}/qr", get(class_handlers::activate_scanning))
        .route("/classes/{id}/scan", post(class_handlers::process_scan))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_professor::require_professor,
        ));

    // --- Student routes ---
    // Require login AND the student role
    let student_routes = Router::new()
        .route("/classes", get(student_handlers::dashboard))
        .route("/join", post(student_handlers::join_class))
        .route("/classes/{id}", get(student_handlers::class_detail))
        .route("/classes/{id}/leave", post(student_handlers::leave_class))
        .route("/qr", get(student_handlers::my_qr_code))
        .route("/verify_qr", post(student_handlers::verify_qr))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_student::require_student,
        ));

    // --- Authenticated routes (role routers nested under their prefixes) ---
    let authenticated_routes = Router::new()
        .route("/logout", post(auth_handlers::handle_logout))
        .nest("/professor", professor_routes)
        .nest("/student", student_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Final router ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

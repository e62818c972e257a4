// src/web/auth_handlers.rs
use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, SignupForm, UserView, ROLE_PROFESSOR, ROLE_STUDENT},
    services::{auth_service, user_service},
    state::AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
};
use serde_json::json;
use tower_sessions::Session;

// POST /signup/student
pub async fn signup_student(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignupForm>,
) -> AppResult<impl IntoResponse> {
    signup(state, session, form, ROLE_STUDENT).await
}

// POST /signup/professor
pub async fn signup_professor(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignupForm>,
) -> AppResult<impl IntoResponse> {
    signup(state, session, form, ROLE_PROFESSOR).await
}

// Shared signup flow: create the account, then log the new user in.
async fn signup(
    state: AppState,
    session: Session,
    form: SignupForm,
    role: &'static str,
) -> AppResult<axum::response::Response> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }

    let user = user_service::create_user(
        &state.db_pool,
        username,
        form.full_name.as_deref().unwrap_or("").trim(),
        &form.password,
        role,
    )
    .await?;

    log_in(&session, &user.id).await?;
    tracing::info!("signup complete for {} '{}'", role, user.username);

    Ok(Json(json!({ "success": true, "user": UserView::from(&user) })).into_response())
}

// POST /login/student
pub async fn login_student(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<impl IntoResponse> {
    login(state, session, form, ROLE_STUDENT).await
}

// POST /login/professor
pub async fn login_professor(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> AppResult<impl IntoResponse> {
    login(state, session, form, ROLE_PROFESSOR).await
}

// Shared login flow. The account must carry the role the endpoint expects;
// a professor cannot log in through the student door and vice versa.
async fn login(
    state: AppState,
    session: Session,
    form: LoginForm,
    expected_role: &'static str,
) -> AppResult<axum::response::Response> {
    tracing::info!("login attempt for '{}'", form.username);

    let Some(user) = user_service::find_user_by_username(&state.db_pool, &form.username).await?
    else {
        tracing::warn!("login failed: unknown username '{}'", form.username);
        return Err(AppError::InvalidCredentials);
    };

    if !auth_service::verify_password(&form.password, &user.password_hash).await? {
        tracing::warn!("login failed: bad password for '{}'", form.username);
        return Err(AppError::InvalidCredentials);
    }

    if user.role != expected_role {
        tracing::warn!(
            "login failed: '{}' is a {}, not a {}",
            form.username,
            user.role,
            expected_role
        );
        return Err(AppError::WrongRole(expected_role));
    }

    log_in(&session, &user.id).await?;
    tracing::info!("login successful for '{}'", user.username);

    Ok(Json(json!({ "success": true, "user": UserView::from(&user) })).into_response())
}

// Rotates the session id before storing the user id.
async fn log_in(session: &Session, user_id: &str) -> AppResult<()> {
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Session(format!("failed to cycle session id: {}", e)))?;
    session
        .insert("user_id", user_id)
        .await
        .map_err(|e| AppError::Session(format!("failed to store session: {}", e)))?;
    Ok(())
}

// POST /logout
pub async fn handle_logout(session: Session) -> AppResult<impl IntoResponse> {
    let user_id: Option<String> = session.get("user_id").await.ok().flatten();

    session
        .delete()
        .await
        .map_err(|e| AppError::Session(format!("failed to delete session: {}", e)))?;

    if let Some(id) = user_id {
        tracing::info!("user '{}' logged out", id);
    }

    Ok(Json(json!({ "success": true })))
}

// src/web/mw_professor.rs
use crate::{
    error::AppError,
    models::user::ROLE_PROFESSOR,
    services::user_service,
    state::AppState,
    web::mw_auth::UserId,
};
use axum::{
    extract::{Extension, Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware that requires the logged-in user to be a professor. Must run
/// after `require_auth`.
pub async fn require_professor(
    State(state): State<AppState>,
    Extension(user_id_ext): Extension<UserId>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user_id = user_id_ext.0;

    match user_service::find_user_by_id(&state.db_pool, &user_id).await? {
        Some(user) if user.role == ROLE_PROFESSOR => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!(
                "professor mw: access denied for {} (role {})",
                user_id,
                user.role
            );
            Err(AppError::WrongRole(ROLE_PROFESSOR))
        }
        None => Err(AppError::Unauthorized),
    }
}

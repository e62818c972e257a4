// src/web/mw_auth.rs
use crate::error::AppError;
use axum::{extract::Request, middleware::Next, response::Response};
use tower_sessions::Session;

/// Middleware that requires a logged-in user. Puts the session's user id in
/// the request extensions for downstream handlers.
pub async fn require_auth(
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match session.get::<String>("user_id").await {
        Ok(Some(user_id)) => {
            tracing::debug!("auth mw: user '{}' authenticated", user_id);
            request.extensions_mut().insert(UserId(user_id));
            Ok(next.run(request).await)
        }
        Ok(None) => {
            tracing::debug!("auth mw: no user_id in session");
            Err(AppError::Unauthorized)
        }
        Err(e) => {
            tracing::error!("auth mw: failed to read session: {:?}", e);
            Err(AppError::Session(format!("failed to read session: {}", e)))
        }
    }
}

/// The authenticated user's id, carried in the request extensions.
#[derive(Clone, Debug)]
pub struct UserId(pub String);

// src/error.rs
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::models::schedule::ScheduleConflict;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("database migration error: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),

    #[error("environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("failed to process password")]
    PasswordHashing,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("this account is not registered as a {0}")]
    WrongRole(&'static str),

    #[error("username is already taken")]
    UsernameTaken,

    #[error("session error: {0}")]
    Session(String),

    #[error("not logged in")]
    Unauthorized,

    #[error("you do not own this class")]
    NotOwner,

    #[error("class not found")]
    ClassNotFound,

    #[error("attendance session not found")]
    SessionNotFound,

    #[error("not found")]
    NotFound,

    #[error("invalid class code")]
    InvalidClassCode,

    #[error("already enrolled in this class")]
    AlreadyEnrolled,

    #[error("invalid time range")]
    InvalidTimeRange,

    #[error("conflicts with an existing {} ({})", .0.source, .0.range)]
    ScheduleConflict(ScheduleConflict),

    #[error("no active class schedule at this time")]
    NoActiveSchedule,

    #[error("no student name provided")]
    EmptyIdentity,

    #[error("no enrolled student found with name \"{0}\"")]
    StudentNotFound(String),

    #[error("attendance already marked for {0}")]
    DuplicateEntry(String),

    #[error("invalid QR code data")]
    MalformedPayload,

    #[error("QR code has expired")]
    ExpiredToken,

    #[error("unexpected internal error")]
    InternalServerError,
}

// How each error kind turns into an HTTP response. The scan endpoints build
// their own wire shape in the handlers; everything else goes through here.
impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("request failed: {:?}", self);

        let status = match &self {
            AppError::Sqlx(_)
            | AppError::SqlxMigrate(_)
            | AppError::EnvVar(_)
            | AppError::PasswordHashing
            | AppError::Session(_)
            | AppError::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,

            AppError::InvalidCredentials | AppError::WrongRole(_) | AppError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }

            AppError::NotOwner => StatusCode::FORBIDDEN,

            AppError::ClassNotFound
            | AppError::SessionNotFound
            | AppError::NotFound
            | AppError::StudentNotFound(_) => StatusCode::NOT_FOUND,

            AppError::UsernameTaken
            | AppError::InvalidClassCode
            | AppError::AlreadyEnrolled
            | AppError::InvalidTimeRange
            | AppError::ScheduleConflict(_)
            | AppError::NoActiveSchedule
            | AppError::EmptyIdentity
            | AppError::DuplicateEntry(_)
            | AppError::MalformedPayload
            | AppError::ExpiredToken => StatusCode::BAD_REQUEST,
        };

        // Internal kinds get a generic message; the details stay in the log.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "an unexpected error occurred".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

// Standard Result type for the application
pub type AppResult<T = ()> = Result<T, AppError>;

// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::user::User,
    services::auth_service,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, created_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_username(
    db_pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, full_name, password_hash, role, created_at
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Creates a user with a hashed password. A taken username is reported as
/// its own error kind, not a database failure.
pub async fn create_user(
    db_pool: &SqlitePool,
    username: &str,
    full_name: &str,
    raw_password: &str,
    role: &str,
) -> AppResult<User> {
    let password_hash = auth_service::hash_password(raw_password).await?;
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, username, full_name, password_hash, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(username)
    .bind(full_name)
    .bind(&password_hash)
    .bind(role)
    .bind(&created_at)
    .execute(db_pool)
    .await;

    if let Err(sqlx::Error::Database(db_err)) = &result {
        // UNIQUE constraint on username (SQLite code 19 / 2067 / 1555)
        if db_err
            .code()
            .map_or(false, |c| c == "19" || c == "2067" || c == "1555")
        {
            tracing::warn!("signup rejected: username '{}' already exists", username);
            return Err(AppError::UsernameTaken);
        }
    }
    result?;

    tracing::info!("created {} account '{}'", role, username);

    Ok(User {
        id,
        username: username.to_string(),
        full_name: full_name.to_string(),
        password_hash,
        role: role.to_string(),
        created_at,
    })
}

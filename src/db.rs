// src/db.rs
use crate::error::AppResult;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

pub async fn create_db_pool() -> AppResult<SqlitePool> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    tracing::info!("connecting to database: {}", database_url);

    // Connection options (create if missing, enforce FKs, busy timeout)
    let options = SqliteConnectOptions::from_str(&database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    tracing::info!("running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("migrations complete.");

    Ok(pool)
}

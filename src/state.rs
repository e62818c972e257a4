// src/state.rs
use chrono::FixedOffset;
use sqlx::SqlitePool;

/// Shared application state. The timezone offset lives here instead of being
/// a process-wide constant so the schedule resolver can be driven with
/// arbitrary instants in tests.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub tz: FixedOffset,
}

// Allows extracting the DB pool directly
impl axum::extract::FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.db_pool.clone()
    }
}

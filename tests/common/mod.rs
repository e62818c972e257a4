// tests/common/mod.rs
#![allow(dead_code)]

use classcheck::models::class::{ClassForm, ClassSection};
use classcheck::services::class_service;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use uuid::Uuid;

/// In-memory database with the real migrations applied. A single connection
/// keeps every query on the same memory store.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("connect to in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    pool
}

/// Inserts a user row directly, skipping bcrypt to keep tests fast.
pub async fn insert_user(pool: &SqlitePool, username: &str, full_name: &str, role: &str) -> String {
    let id = Uuid::new_v4().to_string();
    sqlx::query(
        r#"
        INSERT INTO users (id, username, full_name, password_hash, role, created_at)
        VALUES (?, ?, ?, 'not-a-real-hash', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(username)
    .bind(full_name)
    .bind(role)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .expect("insert user");
    id
}

pub async fn insert_professor(pool: &SqlitePool, username: &str) -> String {
    insert_user(pool, username, "", "professor").await
}

pub async fn insert_student(pool: &SqlitePool, username: &str, full_name: &str) -> String {
    insert_user(pool, username, full_name, "student").await
}

pub async fn create_class(pool: &SqlitePool, professor_id: &str, subject: &str) -> ClassSection {
    class_service::create_class(
        pool,
        professor_id,
        &ClassForm {
            subject: subject.to_string(),
            section: None,
            room: None,
            description: None,
        },
    )
    .await
    .expect("create class")
}

pub async fn enroll(pool: &SqlitePool, student_id: &str, class: &ClassSection) {
    class_service::enroll_by_code(pool, student_id, &class.class_code)
        .await
        .expect("enroll student");
}

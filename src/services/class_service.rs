// src/services/class_service.rs
//
// Classes, announcements and enrollments. Class codes are 6 uppercase
// alphanumeric characters, generated at creation and immutable afterwards.
use crate::{
    error::{AppError, AppResult},
    models::class::{Announcement, ClassForm, ClassOverview, ClassSection, ClassStats},
    services::attendance_service,
};
use chrono::Utc;
use rand::Rng;
use sqlx::SqlitePool;
use uuid::Uuid;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 6;

fn random_code() -> String {
    // Scoped so the thread-local RNG is dropped before any await point.
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARSET[rng.gen_range(0..CODE_CHARSET.len())] as char)
        .collect()
}

/// Generates a class code that is not in use, retrying on collision.
pub async fn generate_class_code(db_pool: &SqlitePool) -> AppResult<String> {
    loop {
        let code = random_code();
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM classes WHERE class_code = ?)")
                .bind(&code)
                .fetch_one(db_pool)
                .await?;
        if !exists {
            return Ok(code);
        }
        tracing::debug!("class code collision on {}, retrying", code);
    }
}

pub async fn create_class(
    db_pool: &SqlitePool,
    professor_id: &str,
    form: &ClassForm,
) -> AppResult<ClassSection> {
    let id = Uuid::new_v4().to_string();
    let class_code = generate_class_code(db_pool).await?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO classes (id, professor_id, subject, section, room, description,
                             class_code, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(professor_id)
    .bind(&form.subject)
    .bind(&form.section)
    .bind(&form.room)
    .bind(&form.description)
    .bind(&class_code)
    .bind(&now)
    .bind(&now)
    .execute(db_pool)
    .await?;

    tracing::info!(
        "professor {} created class \"{}\" (code {})",
        professor_id,
        form.subject,
        class_code
    );

    find_class(db_pool, &id).await
}

pub async fn find_class(db_pool: &SqlitePool, class_id: &str) -> AppResult<ClassSection> {
    sqlx::query_as::<_, ClassSection>(
        r#"
        SELECT id, professor_id, subject, section, room, description, class_code,
               created_at, updated_at
        FROM classes
        WHERE id = ?
        "#,
    )
    .bind(class_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::ClassNotFound)
}

/// Fetches a class and checks the caller owns it.
pub async fn find_owned_class(
    db_pool: &SqlitePool,
    class_id: &str,
    professor_id: &str,
) -> AppResult<ClassSection> {
    let class = find_class(db_pool, class_id).await?;
    if class.professor_id != professor_id {
        tracing::warn!(
            "professor {} tried to access class {} owned by {}",
            professor_id,
            class_id,
            class.professor_id
        );
        return Err(AppError::NotOwner);
    }
    Ok(class)
}

/// Updates the editable fields. The class code never changes after creation.
pub async fn edit_class(
    db_pool: &SqlitePool,
    class_id: &str,
    professor_id: &str,
    form: &ClassForm,
) -> AppResult<ClassSection> {
    find_owned_class(db_pool, class_id, professor_id).await?;

    sqlx::query(
        r#"
        UPDATE classes
        SET subject = ?, section = ?, room = ?, description = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&form.subject)
    .bind(&form.section)
    .bind(&form.room)
    .bind(&form.description)
    .bind(Utc::now().to_rfc3339())
    .bind(class_id)
    .execute(db_pool)
    .await?;

    find_class(db_pool, class_id).await
}

/// Dashboard listing: the professor's classes with per-class counts.
pub async fn list_classes_with_counts(
    db_pool: &SqlitePool,
    professor_id: &str,
) -> AppResult<Vec<ClassOverview>> {
    let classes = sqlx::query_as::<_, ClassOverview>(
        r#"
        SELECT c.id, c.professor_id, c.subject, c.section, c.room, c.description,
               c.class_code, c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM schedules s WHERE s.class_id = c.id) AS schedule_count,
               (SELECT COUNT(*) FROM announcements a WHERE a.class_id = c.id) AS announcement_count,
               (SELECT COUNT(*) FROM attendance_sessions r WHERE r.class_id = c.id) AS attendance_count
        FROM classes c
        WHERE c.professor_id = ?
        ORDER BY c.created_at DESC
        "#,
    )
    .bind(professor_id)
    .fetch_all(db_pool)
    .await?;
    Ok(classes)
}

pub async fn count_students(db_pool: &SqlitePool, class_id: &str) -> AppResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM enrollments WHERE class_id = ?")
        .bind(class_id)
        .fetch_one(db_pool)
        .await?;
    Ok(count)
}

/// Totals plus the average attendance rate (percent, rounded) over all held
/// sessions.
pub async fn class_stats(db_pool: &SqlitePool, class_id: &str) -> AppResult<ClassStats> {
    let total_students = count_students(db_pool, class_id).await?;
    let total_sessions = attendance_service::count_sessions(db_pool, class_id).await?;

    let attendance_rate = if total_students > 0 && total_sessions > 0 {
        let total_present = attendance_service::count_entries_for_class(db_pool, class_id).await?;
        let total_possible = total_students * total_sessions;
        ((total_present as f64 / total_possible as f64) * 100.0).round() as i64
    } else {
        0
    };

    Ok(ClassStats {
        total_students,
        total_sessions,
        attendance_rate,
    })
}

// --- Announcements ---

pub async fn post_announcement(
    db_pool: &SqlitePool,
    class_id: &str,
    title: &str,
    content: &str,
) -> AppResult<Announcement> {
    let id = Uuid::new_v4().to_string();
    let created_at = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO announcements (id, class_id, title, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(class_id)
    .bind(title)
    .bind(content)
    .bind(&created_at)
    .execute(db_pool)
    .await?;

    Ok(Announcement {
        id,
        class_id: class_id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        created_at,
    })
}

pub async fn list_announcements(
    db_pool: &SqlitePool,
    class_id: &str,
    limit: Option<i64>,
) -> AppResult<Vec<Announcement>> {
    let announcements = sqlx::query_as::<_, Announcement>(
        r#"
        SELECT id, class_id, title, content, created_at
        FROM announcements
        WHERE class_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(class_id)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db_pool)
    .await?;
    Ok(announcements)
}

// --- Enrollments ---

/// Enrolls a student via class code. Unknown codes and repeat joins are
/// rejected with their own error kinds.
pub async fn enroll_by_code(
    db_pool: &SqlitePool,
    student_id: &str,
    class_code: &str,
) -> AppResult<ClassSection> {
    let code = class_code.trim().to_uppercase();

    let class = sqlx::query_as::<_, ClassSection>(
        r#"
        SELECT id, professor_id, subject, section, room, description, class_code,
               created_at, updated_at
        FROM classes
        WHERE class_code = ?
        "#,
    )
    .bind(&code)
    .fetch_optional(db_pool)
    .await?
    .ok_or(AppError::InvalidClassCode)?;

    let result = sqlx::query(
        r#"
        INSERT INTO enrollments (id, student_id, class_id, enrolled_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(student_id)
    .bind(&class.id)
    .bind(Utc::now().to_rfc3339())
    .execute(db_pool)
    .await;

    match result {
        Ok(_) => {
            tracing::info!("student {} joined class {}", student_id, class.id);
            Ok(class)
        }
        Err(sqlx::Error::Database(db_err))
            if db_err
                .code()
                .map_or(false, |c| c == "19" || c == "2067" || c == "1555") =>
        {
            Err(AppError::AlreadyEnrolled)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn leave_class(db_pool: &SqlitePool, student_id: &str, class_id: &str) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM enrollments WHERE student_id = ? AND class_id = ?")
        .bind(student_id)
        .bind(class_id)
        .execute(db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    tracing::info!("student {} left class {}", student_id, class_id);
    Ok(())
}

pub async fn is_enrolled(db_pool: &SqlitePool, student_id: &str, class_id: &str) -> AppResult<bool> {
    let enrolled: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = ? AND class_id = ?)",
    )
    .bind(student_id)
    .bind(class_id)
    .fetch_one(db_pool)
    .await?;
    Ok(enrolled)
}

pub async fn list_enrolled_classes(
    db_pool: &SqlitePool,
    student_id: &str,
) -> AppResult<Vec<ClassSection>> {
    let classes = sqlx::query_as::<_, ClassSection>(
        r#"
        SELECT c.id, c.professor_id, c.subject, c.section, c.room, c.description,
               c.class_code, c.created_at, c.updated_at
        FROM classes c
        JOIN enrollments e ON e.class_id = c.id
        WHERE e.student_id = ?
        ORDER BY e.enrolled_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(db_pool)
    .await?;
    Ok(classes)
}

// src/models/class.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Represents a class read from the 'classes' table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClassSection {
    pub id: String,
    pub professor_id: String,
    pub subject: String,
    pub section: Option<String>,
    pub room: Option<String>,
    pub description: Option<String>,
    pub class_code: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Dashboard row: a class plus per-class counts, filled by subselects.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClassOverview {
    pub id: String,
    pub professor_id: String,
    pub subject: String,
    pub section: Option<String>,
    pub room: Option<String>,
    pub description: Option<String>,
    pub class_code: String,
    pub created_at: String,
    pub updated_at: String,
    pub schedule_count: i64,
    pub announcement_count: i64,
    pub attendance_count: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Announcement {
    pub id: String,
    pub class_id: String,
    pub title: String,
    pub content: String,
    pub created_at: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Enrollment {
    pub id: String,
    pub student_id: String,
    pub class_id: String,
    pub enrolled_at: String,
}

/// Aggregate numbers for the professor's class-detail page.
#[derive(Debug, Clone, Serialize)]
pub struct ClassStats {
    pub total_students: i64,
    pub total_sessions: i64,
    pub attendance_rate: i64,
}

#[derive(Debug, Deserialize)]
pub struct ClassForm {
    pub subject: String,
    pub section: Option<String>,
    pub room: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnnouncementForm {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct JoinClassForm {
    pub class_code: String,
}

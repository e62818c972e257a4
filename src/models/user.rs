// src/models/user.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const ROLE_PROFESSOR: &str = "professor";
pub const ROLE_STUDENT: &str = "student";

// Represents a user read from the 'users' table
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

impl User {
    /// Name shown on rosters and encoded in student QR codes: the full name,
    /// falling back to the username when no full name was provided.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// Public view of a user, safe to return from handlers.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub username: String,
    pub full_name: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

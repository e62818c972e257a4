// src/models/schedule.rs
use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Weekday names as stored in the `schedules.day` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Monday",
            DayOfWeek::Tuesday => "Tuesday",
            DayOfWeek::Wednesday => "Wednesday",
            DayOfWeek::Thursday => "Thursday",
            DayOfWeek::Friday => "Friday",
            DayOfWeek::Saturday => "Saturday",
            DayOfWeek::Sunday => "Sunday",
        }
    }

    pub fn from_chrono(weekday: chrono::Weekday) -> Self {
        match weekday {
            chrono::Weekday::Mon => DayOfWeek::Monday,
            chrono::Weekday::Tue => DayOfWeek::Tuesday,
            chrono::Weekday::Wed => DayOfWeek::Wednesday,
            chrono::Weekday::Thu => DayOfWeek::Thursday,
            chrono::Weekday::Fri => DayOfWeek::Friday,
            chrono::Weekday::Sat => DayOfWeek::Saturday,
            chrono::Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring weekly time slot for a class. Times are "HH:MM" strings in the
/// DB; the service layer parses them on use.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeeklySchedule {
    pub id: String,
    pub class_id: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

/// A one-off session (makeup class, review session, ...).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExtraClass {
    pub id: String,
    pub class_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
    pub created_at: String,
}

/// Where a rejected time range collided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    WeeklySchedule,
    ExtraClass,
}

impl fmt::Display for ConflictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSource::WeeklySchedule => f.write_str("weekly schedule"),
            ConflictSource::ExtraClass => f.write_str("extra class"),
        }
    }
}

/// The offending range of a rejected schedule mutation, already formatted
/// for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleConflict {
    pub range: String,
    pub source: ConflictSource,
}

/// The weekly schedule whose window contains a given instant, plus the
/// "HH:MM - HH:MM" label used as part of the attendance-session natural key.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveWindow {
    pub schedule: WeeklySchedule,
    pub schedule_time: String,
}

/// Schedule row joined with its class subject, for the student calendar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScheduleWithClass {
    pub id: String,
    pub class_id: String,
    pub class_name: String,
    pub day: String,
    pub start_time: String,
    pub end_time: String,
}

/// Extra-class row joined with its class subject, for the student calendar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExtraClassWithClass {
    pub id: String,
    pub class_id: String,
    pub class_name: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleForm {
    pub day: DayOfWeek,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtraClassForm {
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub reason: Option<String>,
}

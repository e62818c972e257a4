// src/models/attendance.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One attendance session of a class. `date` is the RFC3339 creation moment;
/// `session_date` ("YYYY-MM-DD") and `schedule_time` ("HH:MM - HH:MM") form
/// the natural key together with `class_id`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceSession {
    pub id: String,
    pub class_id: String,
    pub date: String,
    pub session_date: String,
    pub schedule_time: String,
    pub qr_code_data: Option<String>,
    pub canceled: bool,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AttendanceEntry {
    pub id: String,
    pub session_id: String,
    pub student_id: String,
    pub time_scanned: String,
}

/// Canceled session joined with its class subject, for the student calendar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CanceledSessionWithClass {
    pub class_id: String,
    pub class_name: String,
    pub session_date: String,
    pub schedule_time: String,
}

/// JSON payload embedded in the professor's session QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "classId")]
    pub class_id: String,
    #[serde(rename = "className")]
    pub class_name: String,
    #[serde(rename = "professorId")]
    pub professor_id: String,
    pub timestamp: String,
}

/// Wire shape of every scan endpoint response.
#[derive(Debug, Default, Serialize)]
pub struct ScanResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_marked: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    pub student_name: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQrForm {
    pub qr_code_data: String,
}

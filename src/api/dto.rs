//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use crate::auth::PasswordStrength;
use crate::dashboard::ServiceStats;
use crate::reminders::Reminder;
use crate::storage::{Appointment, AppointmentStatus, Service, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// AUTH DTOs
// ============================================

/// Registration request (client accounts)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Password reset request
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Password reset confirmation
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

/// Password change for the signed-in user
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct ChangePasswordResponse {
    pub status: String,
    pub strength: PasswordStrength,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: Some(message.into()),
        }
    }
}

// ============================================
// APPOINTMENT DTOs
// ============================================

/// Query parameters of the appointment board
#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListParams {
    /// all, pending, today, confirmed, finished
    pub filter: Option<String>,
    /// Case-insensitive match on client or service name
    pub search: Option<String>,
}

/// Client booking request
#[derive(Debug, Deserialize)]
pub struct BookAppointmentRequest {
    pub service_id: String,
    pub date: DateTime<Utc>,
}

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Serialize)]
pub struct AppointmentListResponse {
    pub appointments: Vec<Appointment>,
    pub total: usize,
}

// ============================================
// SERVICE DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct ServiceListParams {
    pub search: Option<String>,
}

/// Create/update payload for a catalog service
#[derive(Debug, Deserialize)]
pub struct ServiceRequest {
    pub name: String,
    pub price: f64,
    /// Minutes
    pub duration: u32,
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<Service>,
    pub stats: ServiceStats,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    /// Whether the default catalog was inserted
    pub seeded: bool,
    pub inserted: usize,
}

// ============================================
// PROFILE DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct MonthlyGoalRequest {
    pub monthly_goal: f64,
}

#[derive(Debug, Deserialize)]
pub struct PushTokenRequest {
    /// `null` clears the stored token
    pub push_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar: String,
}

// ============================================
// FINANCE DTOs
// ============================================

#[derive(Debug, Default, Deserialize)]
pub struct FinanceParams {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

// ============================================
// REMINDER DTOs
// ============================================

#[derive(Debug, Serialize)]
pub struct RemindersResponse {
    pub reminders: Vec<Reminder>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Document store status
    pub storage: String,
    /// Push sender in use ("relay" or "outbox")
    pub push: String,
    pub ws_connections: usize,
    pub pending_reminders: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

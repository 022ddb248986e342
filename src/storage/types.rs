//! Core document types for the salon store
//!
//! This module defines the documents held by the store:
//! - `Appointment`: a booked service slot tied to a client and a time
//! - `Service`: an entry of the service catalog
//! - `SalonSettings`: the published business info (address, contact, hours)
//! - `UserProfile`: role, push token, notification preferences and revenue goal

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monthly revenue goal assumed until the administrator sets one
pub const DEFAULT_MONTHLY_GOAL: f64 = 5000.0;

/// Maximum number of business-hour rows (seven weekdays plus holidays)
pub const MAX_BUSINESS_HOUR_ROWS: usize = 8;

/// Lifecycle status of an appointment
///
/// Transitions are manual and unordered: an administrator may move an
/// appointment between any two states.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Finished,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Finished => "finished",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "finished" => Some(AppointmentStatus::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booked appointment
///
/// Service name and price are copied at booking time, so the appointment
/// survives edits or deletion of the service it references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    pub user_id: String,
    pub user_name: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub price: f64,
    pub professional: String,
    /// Scheduled start of the appointment
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Calendar day of the appointment in the salon's local offset
    pub fn local_day(&self, offset: FixedOffset) -> chrono::NaiveDate {
        self.date.with_timezone(&offset).date_naive()
    }
}

/// Fields supplied when a client books an appointment
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub user_id: String,
    pub user_name: Option<String>,
    pub service_id: String,
    pub service_name: String,
    pub price: f64,
    pub professional: String,
    pub date: DateTime<Utc>,
}

/// Filter used by the appointment board
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentFilter {
    #[default]
    All,
    Pending,
    Today,
    Confirmed,
    Finished,
}

impl AppointmentFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "all" => Some(AppointmentFilter::All),
            "pending" => Some(AppointmentFilter::Pending),
            "today" => Some(AppointmentFilter::Today),
            "confirmed" => Some(AppointmentFilter::Confirmed),
            "finished" => Some(AppointmentFilter::Finished),
            _ => None,
        }
    }

    /// Check whether an appointment passes this filter
    ///
    /// `Today` compares calendar days in the salon offset.
    pub fn matches(&self, appointment: &Appointment, now: DateTime<Utc>, offset: FixedOffset) -> bool {
        match self {
            AppointmentFilter::All => true,
            AppointmentFilter::Today => {
                appointment.local_day(offset) == now.with_timezone(&offset).date_naive()
            }
            AppointmentFilter::Pending => appointment.status == AppointmentStatus::Pending,
            AppointmentFilter::Confirmed => appointment.status == AppointmentStatus::Confirmed,
            AppointmentFilter::Finished => appointment.status == AppointmentStatus::Finished,
        }
    }
}

/// A catalog service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    /// Duration in minutes
    pub duration: u32,
    pub price: f64,
}

/// Fields of a service without its id (create/update payload)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceDraft {
    pub name: String,
    pub duration: u32,
    pub price: f64,
}

impl ServiceDraft {
    pub fn new(name: impl Into<String>, price: f64, duration: u32) -> Self {
        Self {
            name: name.into(),
            duration,
            price,
        }
    }
}

/// Catalog inserted by the first-run setup when no services exist
pub fn default_services() -> Vec<ServiceDraft> {
    vec![
        ServiceDraft::new("Women's Haircut", 80.0, 60),
        ServiceDraft::new("Men's Haircut", 50.0, 30),
        ServiceDraft::new("Progressive Blowout", 250.0, 180),
        ServiceDraft::new("Manicure & Pedicure", 60.0, 90),
        ServiceDraft::new("Hair Hydration", 120.0, 45),
        ServiceDraft::new("Full Coloring", 180.0, 120),
        ServiceDraft::new("Eyebrow Design", 35.0, 20),
    ]
}

/// One row of the published business hours
///
/// Free-form strings, no overlap or validity checking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessHour {
    pub day: String,
    pub open: String,
    pub close: String,
}

/// The `settings/salon_info` document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SalonSettings {
    pub whatsapp: String,
    pub street: String,
    pub number: String,
    pub neighborhood: String,
    pub city: String,
    /// Derived single-line address
    pub address: String,
    #[serde(default)]
    pub business_hours: Vec<BusinessHour>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Partial update merged into `SalonSettings`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SalonSettingsUpdate {
    pub whatsapp: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    pub business_hours: Option<Vec<BusinessHour>>,
}

impl SalonSettings {
    /// Merge an update into the document, re-deriving the address line
    pub fn merge(&mut self, update: SalonSettingsUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.whatsapp {
            self.whatsapp = v;
        }
        if let Some(v) = update.street {
            self.street = v;
        }
        if let Some(v) = update.number {
            self.number = v;
        }
        if let Some(v) = update.neighborhood {
            self.neighborhood = v;
        }
        if let Some(v) = update.city {
            self.city = v;
        }
        if let Some(v) = update.business_hours {
            self.business_hours = v;
        }
        self.address = format!(
            "{}, {} - {}, {}",
            self.street, self.number, self.neighborhood, self.city
        );
        self.last_update = Some(now);
    }
}

/// User role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Client,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Client => "client",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "client" => Some(Role::Client),
            _ => None,
        }
    }
}

/// Notification preference flags
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationPrefs {
    pub reminders: bool,
    pub promotions: bool,
    pub marketing: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            reminders: true,
            promotions: false,
            marketing: true,
        }
    }
}

/// Partial update of notification flags; absent fields are left untouched
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct NotificationPrefsUpdate {
    pub reminders: Option<bool>,
    pub promotions: Option<bool>,
    pub marketing: Option<bool>,
}

impl NotificationPrefs {
    pub fn apply(&mut self, update: NotificationPrefsUpdate) {
        if let Some(v) = update.reminders {
            self.reminders = v;
        }
        if let Some(v) = update.promotions {
            self.promotions = v;
        }
        if let Some(v) = update.marketing {
            self.marketing = v;
        }
    }
}

/// A user document (credentials are kept out of this type)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub push_token: Option<String>,
    pub notifications: NotificationPrefs,
    pub monthly_goal: f64,
    pub avatar: Option<String>,
    pub member_since: DateTime<Utc>,
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn appointment_at(date: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: "a1".to_string(),
            user_id: "u1".to_string(),
            user_name: Some("Carla".to_string()),
            service_id: "s1".to_string(),
            service_name: "Manicure".to_string(),
            price: 35.0,
            professional: "Salon team".to_string(),
            date,
            status,
            created_at: date,
        }
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Finished,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::parse("CONFIRMED"), Some(AppointmentStatus::Confirmed));
        assert!(AppointmentStatus::parse("cancelled").is_none());
    }

    #[test]
    fn test_today_filter_uses_salon_offset() {
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        // 01:30 UTC on the 11th is 22:30 on the 10th at UTC-3
        let appointment = appointment_at(
            Utc.with_ymd_and_hms(2026, 3, 11, 1, 30, 0).unwrap(),
            AppointmentStatus::Pending,
        );
        let now = Utc.with_ymd_and_hms(2026, 3, 10, 15, 0, 0).unwrap();

        assert!(AppointmentFilter::Today.matches(&appointment, now, offset));
        assert!(!AppointmentFilter::Today.matches(&appointment, now, FixedOffset::east_opt(0).unwrap()));
    }

    #[test]
    fn test_status_filters() {
        let now = Utc::now();
        let offset = FixedOffset::east_opt(0).unwrap();
        let finished = appointment_at(now, AppointmentStatus::Finished);

        assert!(AppointmentFilter::All.matches(&finished, now, offset));
        assert!(AppointmentFilter::Finished.matches(&finished, now, offset));
        assert!(!AppointmentFilter::Pending.matches(&finished, now, offset));
        assert!(!AppointmentFilter::Confirmed.matches(&finished, now, offset));
    }

    #[test]
    fn test_settings_merge_derives_address() {
        let mut settings = SalonSettings::default();
        let now = Utc::now();
        settings.merge(
            SalonSettingsUpdate {
                street: Some("Rua das Flores".to_string()),
                number: Some("120".to_string()),
                neighborhood: Some("Centro".to_string()),
                city: Some("Campinas".to_string()),
                whatsapp: Some("(19) 99999-0000".to_string()),
                business_hours: None,
            },
            now,
        );

        assert_eq!(settings.address, "Rua das Flores, 120 - Centro, Campinas");
        assert_eq!(settings.last_update, Some(now));

        // Merge keeps fields that are not part of the update
        settings.merge(
            SalonSettingsUpdate {
                city: Some("Valinhos".to_string()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(settings.street, "Rua das Flores");
        assert_eq!(settings.address, "Rua das Flores, 120 - Centro, Valinhos");
    }

    #[test]
    fn test_notification_prefs_partial_update() {
        let mut prefs = NotificationPrefs::default();
        prefs.apply(NotificationPrefsUpdate {
            reminders: Some(false),
            ..Default::default()
        });
        assert!(!prefs.reminders);
        assert!(prefs.marketing);
        assert!(!prefs.promotions);
    }

    #[test]
    fn test_default_catalog() {
        let services = default_services();
        assert_eq!(services.len(), 7);
        assert!(services.iter().all(|s| s.price > 0.0 && s.duration > 0));
    }
}

//! Appointment Reminders
//!
//! A user's reminder set is derived from their upcoming appointments:
//! one reminder per appointment, firing `lead` before its start, keyed
//! `remind-{appointment_id}`. The set is always replaced wholesale.
//!
//! ```text
//!   appointments (date > now) ──derive──▶ { remind-a1 @ date-1h, ... }
//!                                              │
//!                     tick loop (fire_due) ◀───┘──▶ push relay
//! ```

mod scheduler;

pub use scheduler::{ReminderConfig, ReminderScheduler};

use crate::storage::Appointment;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A pending reminder for one appointment
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Reminder {
    pub key: String,
    pub user_id: String,
    pub appointment_id: String,
    pub service_name: String,
    pub appointment_date: DateTime<Utc>,
    pub fire_at: DateTime<Utc>,
}

/// Identifier of the reminder attached to an appointment
pub fn reminder_key(appointment_id: &str) -> String {
    format!("remind-{}", appointment_id)
}

/// Derive the reminder set for a user's appointments
///
/// Appointments in the past, and those whose reminder instant has already
/// passed, produce nothing. Duplicate appointment ids collapse to one reminder.
pub fn derive_reminders(
    appointments: &[Appointment],
    now: DateTime<Utc>,
    lead: Duration,
) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = Vec::new();

    for appointment in appointments.iter().filter(|a| a.date > now) {
        let fire_at = appointment.date - lead;
        if fire_at <= now {
            continue;
        }

        let key = reminder_key(&appointment.id);
        if reminders.iter().any(|r| r.key == key) {
            continue;
        }

        reminders.push(Reminder {
            key,
            user_id: appointment.user_id.clone(),
            appointment_id: appointment.id.clone(),
            service_name: appointment.service_name.clone(),
            appointment_date: appointment.date,
            fire_at,
        });
    }

    reminders.sort_by_key(|r| r.fire_at);
    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::AppointmentStatus;

    fn appointment(id: &str, date: DateTime<Utc>) -> Appointment {
        Appointment {
            id: id.to_string(),
            user_id: "u1".to_string(),
            user_name: None,
            service_id: "s1".to_string(),
            service_name: "Manicure".to_string(),
            price: 35.0,
            professional: "Salon team".to_string(),
            date,
            status: AppointmentStatus::Pending,
            created_at: date,
        }
    }

    #[test]
    fn test_one_reminder_per_future_appointment() {
        let now = Utc::now();
        let appointments = vec![
            appointment("a1", now + Duration::hours(5)),
            appointment("a2", now + Duration::days(2)),
        ];

        let reminders = derive_reminders(&appointments, now, Duration::hours(1));
        assert_eq!(reminders.len(), 2);
        assert_eq!(reminders[0].key, "remind-a1");
        assert_eq!(reminders[0].fire_at, appointments[0].date - Duration::hours(1));
    }

    #[test]
    fn test_reminder_instant_already_passed_is_skipped() {
        let now = Utc::now();
        // Starts in 30 minutes: the 1-hour-prior instant is in the past
        let appointments = vec![
            appointment("soon", now + Duration::minutes(30)),
            appointment("past", now - Duration::hours(3)),
        ];

        assert!(derive_reminders(&appointments, now, Duration::hours(1)).is_empty());
    }

    #[test]
    fn test_duplicates_collapse_and_sorted() {
        let now = Utc::now();
        let appointments = vec![
            appointment("late", now + Duration::days(3)),
            appointment("early", now + Duration::hours(2)),
            appointment("late", now + Duration::days(3)),
        ];

        let reminders = derive_reminders(&appointments, now, Duration::hours(1));
        let keys: Vec<_> = reminders.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["remind-early", "remind-late"]);
    }
}

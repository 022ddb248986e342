//! Read models for the console screens
//!
//! Filtering, search and headline counters computed over store documents,
//! plus the input checks applied before catalog and settings writes.

use crate::storage::{
    Appointment, AppointmentFilter, AppointmentStatus, SalonSettings, SalonSettingsUpdate,
    Service, ServiceDraft, MAX_BUSINESS_HOUR_ROWS,
};
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

/// Case-insensitive match of a search term against optional fields
fn matches_term(term: &str, fields: &[Option<&str>]) -> bool {
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(term))
}

/// Apply the board filter and search to appointments
///
/// Input order is preserved (the store returns newest date first).
pub fn filter_appointments(
    appointments: Vec<Appointment>,
    filter: AppointmentFilter,
    search: Option<&str>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Vec<Appointment> {
    let term = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    appointments
        .into_iter()
        .filter(|a| filter.matches(a, now, offset))
        .filter(|a| match &term {
            Some(term) => matches_term(
                term,
                &[a.user_name.as_deref(), Some(a.service_name.as_str())],
            ),
            None => true,
        })
        .collect()
}

/// Headline counters of the appointment board
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AppointmentStats {
    pub total: usize,
    pub pending: usize,
    pub confirmed: usize,
    pub finished: usize,
    pub today: usize,
    /// Sum of finished appointment prices
    pub revenue: f64,
}

impl AppointmentStats {
    pub fn compute(appointments: &[Appointment], now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let mut stats = AppointmentStats {
            total: appointments.len(),
            ..Default::default()
        };

        for appointment in appointments {
            match appointment.status {
                AppointmentStatus::Pending => stats.pending += 1,
                AppointmentStatus::Confirmed => stats.confirmed += 1,
                AppointmentStatus::Finished => {
                    stats.finished += 1;
                    stats.revenue += appointment.price;
                }
            }
            if AppointmentFilter::Today.matches(appointment, now, offset) {
                stats.today += 1;
            }
        }

        stats
    }
}

/// Keep services whose name contains the search term
pub fn search_services(services: Vec<Service>, search: Option<&str>) -> Vec<Service> {
    match search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()) {
        Some(term) => services
            .into_iter()
            .filter(|s| matches_term(&term, &[Some(s.name.as_str())]))
            .collect(),
        None => services,
    }
}

/// Catalog counters
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ServiceStats {
    pub total: usize,
    pub average_price: f64,
}

impl ServiceStats {
    pub fn compute(services: &[Service]) -> Self {
        let total = services.len();
        let sum: f64 = services.iter().map(|s| s.price).sum();
        Self {
            total,
            average_price: if total > 0 { sum / total as f64 } else { 0.0 },
        }
    }
}

/// Check a service draft before it is written
pub fn validate_service(draft: &ServiceDraft) -> Result<(), String> {
    if draft.name.trim().is_empty() {
        return Err("Service name is required".to_string());
    }
    if !(draft.price.is_finite() && draft.price > 0.0) {
        return Err("Price must be greater than zero".to_string());
    }
    if draft.duration == 0 {
        return Err("Duration must be greater than zero".to_string());
    }
    Ok(())
}

/// Check a settings update against the document it will be merged into
///
/// Street, WhatsApp and city must be non-empty after the merge.
pub fn validate_settings(current: &SalonSettings, update: &SalonSettingsUpdate) -> Result<(), String> {
    let effective = |new: &Option<String>, old: &str| {
        new.as_deref().unwrap_or(old).trim().is_empty()
    };

    if effective(&update.street, &current.street) {
        return Err("Street is required".to_string());
    }
    if effective(&update.whatsapp, &current.whatsapp) {
        return Err("WhatsApp number is required".to_string());
    }
    if effective(&update.city, &current.city) {
        return Err("City is required".to_string());
    }

    if let Some(hours) = &update.business_hours {
        if hours.len() > MAX_BUSINESS_HOUR_ROWS {
            return Err(format!(
                "At most {} business-hour rows are allowed",
                MAX_BUSINESS_HOUR_ROWS
            ));
        }
    }

    Ok(())
}

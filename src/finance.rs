//! Monthly revenue summary
//!
//! Revenue is computed from appointment documents: finished appointments are
//! realised revenue, confirmed ones are the projection for the month.

use crate::storage::{Appointment, AppointmentStatus};
use chrono::{Datelike, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar month
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Month {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Month containing `now` in the given offset
    pub fn current(offset: FixedOffset) -> Self {
        let today = Utc::now().with_timezone(&offset).date_naive();
        Self {
            year: today.year(),
            month: today.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// First and last calendar day of the month
    pub fn days(self) -> Option<(NaiveDate, NaiveDate)> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1)?;
        let next = self.next();
        let last = NaiveDate::from_ymd_opt(next.year, next.month, 1)?.pred_opt()?;
        Some((first, last))
    }

    fn contains(self, day: NaiveDate) -> bool {
        day.year() == self.year && day.month() == self.month
    }
}

/// Revenue figures for one month
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    /// Sum of finished appointment prices
    pub real: f64,
    /// Sum of confirmed appointment prices
    pub projection: f64,
    /// Number of finished appointments
    pub count: usize,
    pub average_ticket: f64,
    pub goal: f64,
    /// Percentage of the goal reached, capped at 100
    pub progress: f64,
    /// Sum of finished appointment prices over the whole year
    pub total_year: f64,
}

/// Build the summary for `month`
///
/// An appointment belongs to the month of its calendar day in `offset`.
pub fn monthly_summary(
    appointments: &[Appointment],
    month: Month,
    goal: f64,
    offset: FixedOffset,
) -> MonthlySummary {
    let mut real = 0.0;
    let mut projection = 0.0;
    let mut count = 0;
    let mut total_year = 0.0;

    for appointment in appointments {
        let day = appointment.local_day(offset);
        let in_month = month.contains(day);

        match appointment.status {
            AppointmentStatus::Finished => {
                if day.year() == month.year {
                    total_year += appointment.price;
                }
                if in_month {
                    real += appointment.price;
                    count += 1;
                }
            }
            AppointmentStatus::Confirmed if in_month => projection += appointment.price,
            _ => {}
        }
    }

    let average_ticket = real / count.max(1) as f64;
    let progress = if goal > 0.0 {
        (real / goal * 100.0).min(100.0)
    } else {
        0.0
    };

    MonthlySummary {
        year: month.year,
        month: month.month,
        real,
        projection,
        count,
        average_ticket,
        goal,
        progress,
        total_year,
    }
}

/// Goals must be strictly positive finite amounts
pub fn is_valid_goal(goal: f64) -> bool {
    goal.is_finite() && goal > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn appointment(date: DateTime<Utc>, price: f64, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: format!("a-{}-{}", date.timestamp(), price),
            user_id: "u1".to_string(),
            user_name: None,
            service_id: "s1".to_string(),
            service_name: "Cut".to_string(),
            price,
            professional: "Salon team".to_string(),
            date,
            status,
            created_at: date,
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn test_month_navigation_wraps() {
        let jan = Month::new(2026, 1).unwrap();
        assert_eq!(jan.prev(), Month::new(2025, 12).unwrap());
        assert_eq!(Month::new(2025, 12).unwrap().next(), jan);
        assert!(Month::new(2026, 13).is_none());

        let (first, last) = Month::new(2024, 2).unwrap().days().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_summary_figures() {
        let march = |d, h| Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap();
        let appointments = vec![
            appointment(march(2, 10), 100.0, AppointmentStatus::Finished),
            appointment(march(5, 14), 50.0, AppointmentStatus::Finished),
            appointment(march(20, 9), 80.0, AppointmentStatus::Confirmed),
            appointment(march(21, 9), 999.0, AppointmentStatus::Pending),
            appointment(Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap(), 40.0, AppointmentStatus::Finished),
            appointment(Utc.with_ymd_and_hms(2025, 12, 10, 9, 0, 0).unwrap(), 70.0, AppointmentStatus::Finished),
        ];

        let summary = monthly_summary(&appointments, Month::new(2026, 3).unwrap(), 1000.0, utc());
        assert_eq!(summary.real, 150.0);
        assert_eq!(summary.projection, 80.0);
        assert_eq!(summary.count, 2);
        assert_eq!(summary.average_ticket, 75.0);
        assert_eq!(summary.progress, 15.0);
        assert_eq!(summary.total_year, 190.0);
    }

    #[test]
    fn test_empty_month_and_progress_cap() {
        let empty = monthly_summary(&[], Month::new(2026, 3).unwrap(), 5000.0, utc());
        assert_eq!(empty.average_ticket, 0.0);
        assert_eq!(empty.progress, 0.0);

        let big = vec![appointment(
            Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap(),
            9000.0,
            AppointmentStatus::Finished,
        )];
        let capped = monthly_summary(&big, Month::new(2026, 3).unwrap(), 5000.0, utc());
        assert_eq!(capped.progress, 100.0);
    }

    #[test]
    fn test_finishing_adds_to_month_revenue() {
        let date = Utc.with_ymd_and_hms(2026, 4, 15, 15, 0, 0).unwrap();
        let mut appointments = vec![appointment(date, 120.0, AppointmentStatus::Confirmed)];
        let april = Month::new(2026, 4).unwrap();

        assert_eq!(monthly_summary(&appointments, april, 5000.0, utc()).real, 0.0);

        appointments[0].status = AppointmentStatus::Finished;
        let summary = monthly_summary(&appointments, april, 5000.0, utc());
        assert_eq!(summary.real, 120.0);
        assert_eq!(summary.projection, 0.0);
    }

    #[test]
    fn test_month_boundary_uses_salon_offset() {
        // 02:00 UTC on April 1st is still March 31st at UTC-3
        let date = Utc.with_ymd_and_hms(2026, 4, 1, 2, 0, 0).unwrap();
        let appointments = vec![appointment(date, 60.0, AppointmentStatus::Finished)];
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();

        let march = monthly_summary(&appointments, Month::new(2026, 3).unwrap(), 5000.0, offset);
        assert_eq!(march.real, 60.0);
        let april = monthly_summary(&appointments, Month::new(2026, 4).unwrap(), 5000.0, offset);
        assert_eq!(april.real, 0.0);
    }

    #[test]
    fn test_goal_validation() {
        assert!(is_valid_goal(5000.0));
        assert!(!is_valid_goal(0.0));
        assert!(!is_valid_goal(-1.0));
        assert!(!is_valid_goal(f64::NAN));
    }
}

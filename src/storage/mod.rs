//! Salon Document Store
//!
//! Durable state for the salon console:
//!
//! - **types**: Documents (Appointment, Service, SalonSettings, UserProfile)
//! - **engine**: SQLite-backed store for all collections
//! - **blobs**: Filesystem blob store for avatars
//! - **error**: Error types
//!
//! # Layout
//!
//! ```text
//! {data_dir}/
//!   salon.db                  users, services, appointments, settings
//!   blobs/avatars/{id}.jpg    uploaded profile pictures
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use salon::storage::{SalonStore, StoreConfig, ServiceDraft};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = SalonStore::open(&StoreConfig::new("./data"))?;
//!     store.create_service(&ServiceDraft::new("Manicure", 35.0, 40))?;
//!     println!("{} services", store.list_services()?.len());
//!     Ok(())
//! }
//! ```

pub mod blobs;
pub mod engine;
pub mod error;
pub mod types;

pub use blobs::BlobStore;
pub use engine::{SalonStore, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use types::{
    default_services, Appointment, AppointmentFilter, AppointmentStatus, BusinessHour,
    NewAppointment, NotificationPrefs, NotificationPrefsUpdate, Role, SalonSettings,
    SalonSettingsUpdate, Service, ServiceDraft, UserProfile, DEFAULT_MONTHLY_GOAL,
    MAX_BUSINESS_HOUR_ROWS,
};

/// Generate a new document id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
